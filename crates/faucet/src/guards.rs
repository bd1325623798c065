//! Eligibility guards for claim-style operations.
//!
//! Each guard is a pure predicate over the config and one claimer record.
//! They run before any write, in a fixed order, and the first failure wins:
//! liveness, then blacklist, then cooldown.

use crate::error::{FaucetError, FaucetResult};
use crate::state::{ClaimerRecord, FaucetConfig};
use drip_common::types::Timestamp;

pub fn ensure_not_paused(config: &FaucetConfig) -> FaucetResult<()> {
    if config.paused {
        return Err(FaucetError::FaucetPaused);
    }
    Ok(())
}

pub fn ensure_not_blacklisted(record: &ClaimerRecord) -> FaucetResult<()> {
    if record.blacklisted {
        return Err(FaucetError::AddressBlacklisted);
    }
    Ok(())
}

/// Earliest time the cooldown guard lets `record` claim again.
///
/// `Ok(None)` when claiming is disabled (frequency 0). A claimer that never
/// claimed is eligible from timestamp 0.
pub fn next_claim_at(config: &FaucetConfig, record: &ClaimerRecord) -> FaucetResult<Option<Timestamp>> {
    if config.claim_frequency_secs == 0 {
        return Ok(None);
    }
    if !record.has_claimed() {
        return Ok(Some(0));
    }
    record
        .last_claim_timestamp
        .checked_add(config.claim_frequency_secs)
        .map(Some)
        .ok_or(FaucetError::ArithmeticOverflow("cooldown"))
}

pub fn ensure_cooldown_elapsed(
    config: &FaucetConfig,
    record: &ClaimerRecord,
    now: Timestamp,
) -> FaucetResult<()> {
    match next_claim_at(config, record)? {
        None => Err(FaucetError::FrequencyNotConfigured),
        Some(next) if now < next => Err(FaucetError::CooldownActive { next_claim_at: next }),
        Some(_) => Ok(()),
    }
}

/// All three guards, in order.
pub fn check_claim_eligibility(
    config: &FaucetConfig,
    record: &ClaimerRecord,
    now: Timestamp,
) -> FaucetResult<()> {
    ensure_not_paused(config)?;
    ensure_not_blacklisted(record)?;
    ensure_cooldown_elapsed(config, record, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(freq: u64, paused: bool) -> FaucetConfig {
        FaucetConfig {
            claim_amount: 100,
            claim_frequency_secs: freq,
            referral_bonus_percent: 0,
            paused,
        }
    }

    fn claimed_at(ts: Timestamp) -> ClaimerRecord {
        ClaimerRecord {
            last_claim_timestamp: ts,
            total_claims_made: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_claimer_passes_at_any_time() {
        let fresh = ClaimerRecord::default();
        for now in [0, 1, 59, 1_700_000_000] {
            assert_eq!(check_claim_eligibility(&config(60, false), &fresh, now), Ok(()));
        }
    }

    #[test]
    fn test_cooldown_boundary() {
        let record = claimed_at(1_000);
        let cfg = config(60, false);
        assert_eq!(
            ensure_cooldown_elapsed(&cfg, &record, 1_059),
            Err(FaucetError::CooldownActive { next_claim_at: 1_060 })
        );
        assert_eq!(ensure_cooldown_elapsed(&cfg, &record, 1_060), Ok(()));
    }

    #[test]
    fn test_zero_frequency_disables_claims() {
        assert_eq!(
            ensure_cooldown_elapsed(&config(0, false), &ClaimerRecord::default(), 5),
            Err(FaucetError::FrequencyNotConfigured)
        );
        assert_eq!(next_claim_at(&config(0, false), &claimed_at(5)), Ok(None));
    }

    #[test]
    fn test_guard_order_pause_blacklist_cooldown() {
        let blacklisted_in_cooldown = ClaimerRecord {
            blacklisted: true,
            ..claimed_at(1_000)
        };
        assert_eq!(
            check_claim_eligibility(&config(60, true), &blacklisted_in_cooldown, 1_001),
            Err(FaucetError::FaucetPaused)
        );
        assert_eq!(
            check_claim_eligibility(&config(60, false), &blacklisted_in_cooldown, 1_001),
            Err(FaucetError::AddressBlacklisted)
        );
        assert_eq!(
            check_claim_eligibility(&config(0, false), &blacklisted_in_cooldown, 1_001),
            Err(FaucetError::AddressBlacklisted)
        );
    }

    #[test]
    fn test_cooldown_overflow_is_reported() {
        let cfg = config(u64::MAX, false);
        assert_eq!(
            next_claim_at(&cfg, &claimed_at(10)),
            Err(FaucetError::ArithmeticOverflow("cooldown"))
        );
    }
}

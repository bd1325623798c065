//! Ledger state: owner-controlled parameters, per-claimer records and
//! referral links.

use drip_common::types::{amount_serde, Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owner-tunable faucet parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Tokens handed out per claim
    #[serde(with = "amount_serde")]
    pub claim_amount: Amount,

    /// Minimum seconds between two claims by the same address. 0 disables claiming.
    pub claim_frequency_secs: u64,

    /// Referral bonus as a percentage of `claim_amount`. Not capped at 100.
    pub referral_bonus_percent: u64,

    pub paused: bool,
}

/// Per-address bookkeeping. Created lazily with zero values on first write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimerRecord {
    pub last_claim_timestamp: Timestamp,
    pub blacklisted: bool,
    #[serde(with = "amount_serde")]
    pub total_tokens_claimed: Amount,
    pub total_claims_made: u64,
    /// Times this address was credited as a referrer
    pub total_referral_claims_received: u64,
}

impl ClaimerRecord {
    /// Whether a self-service claim by this address has ever committed.
    ///
    /// The claim timestamp and the claim counter always commit together, so
    /// the counter alone tells a fresh claimer apart from one who claimed at
    /// timestamp zero.
    pub fn has_claimed(&self) -> bool {
        self.total_claims_made > 0
    }
}

/// Complete state owned by one faucet ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetState {
    pub config: FaucetConfig,
    pub claimers: BTreeMap<Address, ClaimerRecord>,
    /// claimer -> referrer, written once per claimer
    pub referrals: BTreeMap<Address, Address>,
}

impl FaucetState {
    pub fn new(config: FaucetConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record for `address`, or the zero-valued default for unknown addresses.
    pub fn record(&self, address: &Address) -> ClaimerRecord {
        self.claimers.get(address).copied().unwrap_or_default()
    }

    pub fn referrer_of(&self, address: &Address) -> Option<Address> {
        self.referrals.get(address).copied()
    }

    /// Apply a committed set of writes.
    pub(crate) fn apply(
        &mut self,
        config: FaucetConfig,
        records: impl IntoIterator<Item = (Address, ClaimerRecord)>,
        referrals: impl IntoIterator<Item = (Address, Address)>,
    ) {
        self.config = config;
        self.claimers.extend(records);
        for (claimer, referrer) in referrals {
            self.referrals.entry(claimer).or_insert(referrer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_address_has_default_record() {
        let state = FaucetState::default();
        let record = state.record(&Address::from_low_u64(7));
        assert_eq!(record, ClaimerRecord::default());
        assert!(!record.has_claimed());
        assert_eq!(state.referrer_of(&Address::from_low_u64(7)), None);
    }

    #[test]
    fn test_apply_keeps_first_referral_link() {
        let claimer = Address::from_low_u64(1);
        let first = Address::from_low_u64(2);
        let second = Address::from_low_u64(3);

        let mut state = FaucetState::default();
        state.apply(FaucetConfig::default(), Vec::new(), vec![(claimer, first)]);
        state.apply(FaucetConfig::default(), Vec::new(), vec![(claimer, second)]);

        assert_eq!(state.referrer_of(&claimer), Some(first));
    }

    #[test]
    fn test_state_json_roundtrip_keeps_address_keys() {
        let mut state = FaucetState::new(FaucetConfig {
            claim_amount: 100,
            claim_frequency_secs: 60,
            referral_bonus_percent: 10,
            paused: false,
        });
        state.claimers.insert(
            Address::from_low_u64(9),
            ClaimerRecord { total_claims_made: 1, total_tokens_claimed: 100, ..Default::default() },
        );

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("0x0000000000000000000000000000000000000009"));
        let back: FaucetState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}

//! Faucet configuration

use crate::state::FaucetConfig;
use anyhow::{Context, Result};
use drip_common::types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Startup settings for a faucet ledger and its in-memory asset ledger.
///
/// Amounts are decimal strings so 18-decimal token quantities survive every
/// config format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetSettings {
    /// Address allowed to run administrative operations
    pub owner: Address,

    /// Address whose token balance backs every claim
    pub pool: Address,

    /// Amount dispensed per claim (smallest token unit)
    pub claim_amount: String,

    /// Cooldown between claims for the same address (seconds)
    pub claim_frequency_secs: u64,

    /// Referral bonus, percent of `claim_amount`
    pub referral_bonus_percent: u64,

    /// Start paused
    pub paused: bool,

    /// Tokens minted into the pool at startup
    pub initial_pool_balance: String,

    /// Native currency held by the pool at startup
    pub initial_native_balance: String,
}

impl Default for FaucetSettings {
    fn default() -> Self {
        Self {
            owner: Address::from_low_u64(1),
            pool: Address::from_low_u64(0xfa0c),
            claim_amount: "1000000000000000000".to_string(), // 1 token at 18 decimals
            claim_frequency_secs: 86400, // 24 hours
            referral_bonus_percent: 10,
            paused: false,
            initial_pool_balance: "1000000000000000000000".to_string(), // 1000 tokens
            initial_native_balance: "0".to_string(),
        }
    }
}

impl FaucetSettings {
    /// Load from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Override fields from `DRIP_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(owner) = std::env::var("DRIP_OWNER") {
            self.owner = owner.parse().context("DRIP_OWNER is not an address")?;
        }

        if let Ok(pool) = std::env::var("DRIP_POOL") {
            self.pool = pool.parse().context("DRIP_POOL is not an address")?;
        }

        if let Ok(amount) = std::env::var("DRIP_CLAIM_AMOUNT") {
            self.claim_amount = amount;
        }

        if let Ok(freq) = std::env::var("DRIP_CLAIM_FREQUENCY") {
            self.claim_frequency_secs = freq.parse().context("DRIP_CLAIM_FREQUENCY is not a number")?;
        }

        if let Ok(percent) = std::env::var("DRIP_REFERRAL_BONUS_PERCENT") {
            self.referral_bonus_percent =
                percent.parse().context("DRIP_REFERRAL_BONUS_PERCENT is not a number")?;
        }

        if let Ok(paused) = std::env::var("DRIP_PAUSED") {
            self.paused = paused.to_lowercase() == "true";
        }

        Ok(())
    }

    /// Ledger parameters described by these settings.
    pub fn faucet_config(&self) -> Result<FaucetConfig> {
        Ok(FaucetConfig {
            claim_amount: parse_amount("claim_amount", &self.claim_amount)?,
            claim_frequency_secs: self.claim_frequency_secs,
            referral_bonus_percent: self.referral_bonus_percent,
            paused: self.paused,
        })
    }

    pub fn initial_pool_balance(&self) -> Result<Amount> {
        parse_amount("initial_pool_balance", &self.initial_pool_balance)
    }

    pub fn initial_native_balance(&self) -> Result<Amount> {
        parse_amount("initial_native_balance", &self.initial_native_balance)
    }
}

fn parse_amount(field: &str, value: &str) -> Result<Amount> {
    value
        .trim()
        .parse::<Amount>()
        .with_context(|| format!("{} must be a non-negative integer, got {:?}", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_parse() {
        let settings = FaucetSettings::default();
        let config = settings.faucet_config().unwrap();
        assert_eq!(config.claim_amount, 1_000_000_000_000_000_000);
        assert_eq!(config.claim_frequency_secs, 86400);
        assert_eq!(settings.initial_pool_balance().unwrap(), 1_000 * 1_000_000_000_000_000_000);
        assert_eq!(settings.initial_native_balance().unwrap(), 0);
    }

    #[test]
    fn test_bad_amount_is_reported() {
        let settings = FaucetSettings {
            claim_amount: "lots".to_string(),
            ..Default::default()
        };
        let err = settings.faucet_config().unwrap_err();
        assert!(err.to_string().contains("claim_amount"));
    }

    #[test]
    fn test_from_env_overrides_defaults() {
        std::env::set_var("DRIP_REFERRAL_BONUS_PERCENT", "37");
        let settings = FaucetSettings::from_env();
        std::env::remove_var("DRIP_REFERRAL_BONUS_PERCENT");

        let settings = settings.unwrap();
        assert_eq!(settings.referral_bonus_percent, 37);
        assert_eq!(settings.claim_frequency_secs, 86400);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: FaucetSettings = serde_json::from_str(
            r#"{"claim_amount": "100", "owner": "0x00000000000000000000000000000000000000aa"}"#,
        )
        .unwrap();
        assert_eq!(settings.faucet_config().unwrap().claim_amount, 100);
        assert_eq!(settings.owner, Address::from_low_u64(0xaa));
        assert_eq!(settings.referral_bonus_percent, 10);
    }
}

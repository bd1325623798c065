use anyhow::Result;
use drip_common::utils::config::load_config;
use drip_common::utils::logging::LoggingConfig;
use drip_faucet::FaucetSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DripConfig {
    #[serde(default)]
    pub faucet: FaucetSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File (if any), then `DRIP_*` environment variables, then CLI flags.
pub fn load_drip_config(path: Option<&Path>, args: &Cli) -> Result<DripConfig> {
    let mut config = match path {
        Some(path) => {
            let mut config: DripConfig = load_config(path)?;
            config.faucet.apply_env()?;
            config
        }
        None => DripConfig {
            faucet: FaucetSettings::from_env()?,
            logging: LoggingConfig::default(),
        },
    };

    if let Some(amount) = &args.claim_amount {
        config.faucet.claim_amount = amount.clone();
    }
    if let Some(freq) = args.claim_frequency {
        config.faucet.claim_frequency_secs = freq;
    }
    if let Some(percent) = args.referral_bonus_percent {
        config.faucet.referral_bonus_percent = percent;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    // Fail early on malformed amounts.
    config.faucet.faucet_config()?;
    Ok(config)
}

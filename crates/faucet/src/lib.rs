//! Token faucet ledger
//!
//! Addresses periodically withdraw a fixed amount of a token from a shared
//! pool, optionally crediting a referrer with a bonus, under owner controls:
//! - Cooldown, pause and blacklist guards
//! - Referral links and bonus accounting
//! - All-or-nothing operations over an external asset ledger
//! - A single-writer async service with Prometheus metrics

pub mod access;
pub mod asset;
pub mod config;
pub mod error;
pub mod events;
pub mod guards;
pub mod ledger;
pub mod metrics;
pub mod service;
pub mod state;

pub use access::{AccessControl, SingleOwner};
pub use asset::{AssetLedger, InMemoryAssetLedger};
pub use config::FaucetSettings;
pub use error::{ErrorCategory, FaucetError, FaucetResult};
pub use events::{FaucetEvent, TokensClaimed};
pub use ledger::{referral_bonus, FaucetLedger, ReferralPayout, Withdrawal};
pub use metrics::FaucetMetrics;
pub use service::{ClaimerStats, Executed, FaucetRequest, FaucetResponse, FaucetService, FaucetStatus};
pub use state::{ClaimerRecord, FaucetConfig, FaucetState};

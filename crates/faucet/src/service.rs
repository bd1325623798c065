//! Faucet service: serializes requests onto a single ledger.
//!
//! The ledger itself assumes one operation at a time. The service owns it
//! behind an async mutex so any number of tasks can submit requests; each
//! request runs to completion before the next is admitted, which keeps the
//! balance check and the debit of a claim from interleaving with another
//! request.

use crate::access::{AccessControl, SingleOwner};
use crate::asset::{AssetLedger, InMemoryAssetLedger};
use crate::config::FaucetSettings;
use crate::error::{FaucetError, FaucetResult};
use crate::events::FaucetEvent;
use crate::ledger::{FaucetLedger, ReferralPayout, Withdrawal};
use crate::metrics::FaucetMetrics;
use crate::state::FaucetConfig;
use chrono::Utc;
use drip_common::types::{amount_serde, Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// One authenticated request against the faucet.
///
/// `caller` is trusted: authentication happens in front of the service.
/// Claim timestamps default to the wall clock when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FaucetRequest {
    Claim {
        caller: Address,
        #[serde(default)]
        now: Option<Timestamp>,
    },
    ClaimWithReferral {
        caller: Address,
        referrer: Address,
        #[serde(default)]
        now: Option<Timestamp>,
    },
    OwnerClaim {
        caller: Address,
        claimer: Address,
    },
    Deposit {
        caller: Address,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    SetClaimAmount {
        caller: Address,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    SetClaimFrequency {
        caller: Address,
        seconds: u64,
    },
    SetReferralBonusPercent {
        caller: Address,
        percent: u64,
    },
    TogglePause {
        caller: Address,
    },
    Blacklist {
        caller: Address,
        address: Address,
    },
    Unblacklist {
        caller: Address,
        address: Address,
    },
    WithdrawAll {
        caller: Address,
    },
    ClaimerStats {
        address: Address,
    },
    FaucetBalance,
    Status,
}

impl FaucetRequest {
    /// Operation name used in logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            FaucetRequest::Claim { .. } => "claim",
            FaucetRequest::ClaimWithReferral { .. } => "claim_with_referral",
            FaucetRequest::OwnerClaim { .. } => "owner_claim",
            FaucetRequest::Deposit { .. } => "deposit",
            FaucetRequest::SetClaimAmount { .. } => "set_claim_amount",
            FaucetRequest::SetClaimFrequency { .. } => "set_claim_frequency",
            FaucetRequest::SetReferralBonusPercent { .. } => "set_referral_bonus_percent",
            FaucetRequest::TogglePause { .. } => "toggle_pause",
            FaucetRequest::Blacklist { .. } => "blacklist",
            FaucetRequest::Unblacklist { .. } => "unblacklist",
            FaucetRequest::WithdrawAll { .. } => "withdraw_all",
            FaucetRequest::ClaimerStats { .. } => "claimer_stats",
            FaucetRequest::FaucetBalance => "faucet_balance",
            FaucetRequest::Status => "status",
        }
    }
}

/// Successful result of a [`FaucetRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FaucetResponse {
    Claimed {
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    ReferralClaimed(ReferralPayout),
    Done,
    PauseToggled {
        paused: bool,
    },
    Withdrawn(Withdrawal),
    ClaimerStats(ClaimerStats),
    Balance {
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    Status(FaucetStatus),
}

/// Per-address view combining the record, the referral link and the cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimerStats {
    pub address: Address,
    #[serde(with = "amount_serde")]
    pub total_tokens_claimed: Amount,
    pub total_claims_made: u64,
    pub total_referral_claims_received: u64,
    pub blacklisted: bool,
    pub last_claim_timestamp: Timestamp,
    pub referrer: Option<Address>,
    pub next_claim_at: Option<Timestamp>,
}

/// Faucet status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaucetStatus {
    pub pool: Address,
    pub config: FaucetConfig,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
    #[serde(with = "amount_serde")]
    pub native_balance: Amount,
    pub known_addresses: usize,
}

/// Response plus the facts the request emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Executed {
    pub response: FaucetResponse,
    pub events: Vec<FaucetEvent>,
}

/// Faucet service
pub struct FaucetService<A: AssetLedger, C: AccessControl> {
    ledger: Mutex<FaucetLedger<A, C>>,
    metrics: FaucetMetrics,
}

impl FaucetService<InMemoryAssetLedger, SingleOwner> {
    /// Build a service over a fresh in-memory asset ledger, funding the pool
    /// as the settings describe.
    pub fn from_settings(settings: &FaucetSettings) -> anyhow::Result<Self> {
        let config = settings.faucet_config()?;

        let mut assets = InMemoryAssetLedger::new();
        assets.mint(&settings.pool, settings.initial_pool_balance()?);
        assets.fund_native(&settings.pool, settings.initial_native_balance()?);

        let ledger = FaucetLedger::new(config, settings.pool, assets, SingleOwner::new(settings.owner));
        let metrics = FaucetMetrics::new()?;
        info!("Faucet service initialized: owner={}, pool={}", settings.owner, settings.pool);
        Ok(Self::new(ledger, metrics))
    }
}

impl<A: AssetLedger, C: AccessControl> FaucetService<A, C> {
    pub fn new(ledger: FaucetLedger<A, C>, metrics: FaucetMetrics) -> Self {
        metrics.update_pool_balance(ledger.faucet_balance());
        Self {
            ledger: Mutex::new(ledger),
            metrics,
        }
    }

    pub fn metrics(&self) -> &FaucetMetrics {
        &self.metrics
    }

    /// Run one request to completion.
    #[instrument(skip_all, fields(operation = request.operation()))]
    pub async fn execute(&self, request: FaucetRequest) -> FaucetResult<Executed> {
        let operation = request.operation();
        let mut ledger = self.ledger.lock().await;

        let result = dispatch(&mut *ledger, request);
        let events = ledger.take_events();
        self.metrics.update_pool_balance(ledger.faucet_balance());
        drop(ledger);

        match result {
            Ok(response) => {
                self.metrics.record_success(operation);
                match &response {
                    FaucetResponse::Claimed { amount } => self.metrics.record_dispensed(*amount),
                    FaucetResponse::ReferralClaimed(payout) => self
                        .metrics
                        .record_dispensed(payout.claimer_amount.saturating_add(payout.referrer_bonus)),
                    _ => {}
                }
                debug!("Request committed with {} events", events.len());
                Ok(Executed { response, events })
            }
            Err(err) => {
                self.metrics.record_rejection(operation, err.code());
                Err(err)
            }
        }
    }

    pub async fn status(&self) -> FaucetStatus {
        let ledger = self.ledger.lock().await;
        status_of(&*ledger)
    }
}

fn wall_clock() -> Timestamp {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn dispatch<A: AssetLedger, C: AccessControl>(
    ledger: &mut FaucetLedger<A, C>,
    request: FaucetRequest,
) -> Result<FaucetResponse, FaucetError> {
    let response = match request {
        FaucetRequest::Claim { caller, now } => FaucetResponse::Claimed {
            amount: ledger.claim(caller, now.unwrap_or_else(wall_clock))?,
        },
        FaucetRequest::ClaimWithReferral { caller, referrer, now } => FaucetResponse::ReferralClaimed(
            ledger.claim_with_referral(caller, referrer, now.unwrap_or_else(wall_clock))?,
        ),
        FaucetRequest::OwnerClaim { caller, claimer } => FaucetResponse::Claimed {
            amount: ledger.owner_claim(caller, claimer)?,
        },
        FaucetRequest::Deposit { caller, amount } => {
            ledger.deposit(caller, amount)?;
            FaucetResponse::Done
        }
        FaucetRequest::SetClaimAmount { caller, amount } => {
            ledger.set_claim_amount(caller, amount)?;
            FaucetResponse::Done
        }
        FaucetRequest::SetClaimFrequency { caller, seconds } => {
            ledger.set_claim_frequency(caller, seconds)?;
            FaucetResponse::Done
        }
        FaucetRequest::SetReferralBonusPercent { caller, percent } => {
            ledger.set_referral_bonus_percent(caller, percent)?;
            FaucetResponse::Done
        }
        FaucetRequest::TogglePause { caller } => FaucetResponse::PauseToggled {
            paused: ledger.toggle_pause(caller)?,
        },
        FaucetRequest::Blacklist { caller, address } => {
            ledger.blacklist(caller, address)?;
            FaucetResponse::Done
        }
        FaucetRequest::Unblacklist { caller, address } => {
            ledger.unblacklist(caller, address)?;
            FaucetResponse::Done
        }
        FaucetRequest::WithdrawAll { caller } => FaucetResponse::Withdrawn(ledger.withdraw_all(caller)?),
        FaucetRequest::ClaimerStats { address } => FaucetResponse::ClaimerStats(stats_of(ledger, address)?),
        FaucetRequest::FaucetBalance => FaucetResponse::Balance {
            amount: ledger.faucet_balance(),
        },
        FaucetRequest::Status => FaucetResponse::Status(status_of(ledger)),
    };
    Ok(response)
}

fn stats_of<A: AssetLedger, C: AccessControl>(
    ledger: &FaucetLedger<A, C>,
    address: Address,
) -> FaucetResult<ClaimerStats> {
    let record = ledger.claimer_record(&address);
    Ok(ClaimerStats {
        address,
        total_tokens_claimed: record.total_tokens_claimed,
        total_claims_made: record.total_claims_made,
        total_referral_claims_received: record.total_referral_claims_received,
        blacklisted: record.blacklisted,
        last_claim_timestamp: record.last_claim_timestamp,
        referrer: ledger.referrer_of(&address),
        next_claim_at: ledger.next_claim_at(&address)?,
    })
}

fn status_of<A: AssetLedger, C: AccessControl>(ledger: &FaucetLedger<A, C>) -> FaucetStatus {
    FaucetStatus {
        pool: ledger.pool(),
        config: *ledger.config(),
        balance: ledger.faucet_balance(),
        native_balance: ledger.native_balance(),
        known_addresses: ledger.state().claimers.len(),
    }
}

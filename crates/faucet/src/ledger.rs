//! The faucet state machine.
//!
//! Every operation runs against a [`Staged`] view: reads fall through to the
//! committed state, writes and emitted facts are buffered, and asset
//! movements happen between `checkpoint` and `rollback`/`release` on the
//! asset ledger. A failing operation therefore leaves state, balances and
//! the event buffer exactly as they were.

use crate::access::AccessControl;
use crate::asset::AssetLedger;
use crate::error::{ErrorCategory, FaucetError, FaucetResult};
use crate::events::{FaucetEvent, TokensClaimed};
use crate::guards::{self, check_claim_eligibility, ensure_not_blacklisted, ensure_not_paused};
use crate::state::{ClaimerRecord, FaucetConfig, FaucetState};
use drip_common::types::{Address, Amount, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// `floor(claim_amount * percent / 100)`.
pub fn referral_bonus(claim_amount: Amount, percent: u64) -> FaucetResult<Amount> {
    claim_amount
        .checked_mul(Amount::from(percent))
        .map(|scaled| scaled / 100)
        .ok_or(FaucetError::ArithmeticOverflow("referral bonus"))
}

/// Funds moved by a successful referral claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferralPayout {
    /// Sent to the claimer: claim amount plus bonus
    #[serde(with = "drip_common::types::amount_serde")]
    pub claimer_amount: Amount,
    /// Sent to the referrer
    #[serde(with = "drip_common::types::amount_serde")]
    pub referrer_bonus: Amount,
}

/// Balances moved to the owner by `withdraw_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    #[serde(with = "drip_common::types::amount_serde")]
    pub native: Amount,
    #[serde(with = "drip_common::types::amount_serde")]
    pub tokens: Amount,
}

/// Writes produced by one operation, ready to commit.
struct Writes {
    config: FaucetConfig,
    records: BTreeMap<Address, ClaimerRecord>,
    referrals: BTreeMap<Address, Address>,
    events: Vec<FaucetEvent>,
}

/// Copy-on-write view of the ledger for the duration of one operation.
struct Staged<'a, A: AssetLedger> {
    committed: &'a FaucetState,
    assets: &'a mut A,
    pool: Address,
    config: FaucetConfig,
    records: BTreeMap<Address, ClaimerRecord>,
    referrals: BTreeMap<Address, Address>,
    events: Vec<FaucetEvent>,
}

impl<'a, A: AssetLedger> Staged<'a, A> {
    fn new(committed: &'a FaucetState, assets: &'a mut A, pool: Address) -> Self {
        Self {
            committed,
            assets,
            pool,
            config: committed.config,
            records: BTreeMap::new(),
            referrals: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    fn record(&self, address: &Address) -> ClaimerRecord {
        self.records
            .get(address)
            .copied()
            .unwrap_or_else(|| self.committed.record(address))
    }

    fn record_mut(&mut self, address: &Address) -> &mut ClaimerRecord {
        let committed = self.committed;
        self.records
            .entry(*address)
            .or_insert_with(|| committed.record(address))
    }

    fn referrer_of(&self, claimer: &Address) -> Option<Address> {
        self.committed
            .referrer_of(claimer)
            .or_else(|| self.referrals.get(claimer).copied())
    }

    fn emit(&mut self, event: FaucetEvent) {
        self.events.push(event);
    }

    fn into_writes(self) -> Writes {
        Writes {
            config: self.config,
            records: self.records,
            referrals: self.referrals,
            events: self.events,
        }
    }

    fn ensure_not_pool(&self, claimer: &Address) -> FaucetResult<()> {
        if *claimer == self.pool {
            return Err(FaucetError::InvalidClaimer);
        }
        Ok(())
    }

    fn claim(&mut self, caller: Address, now: Timestamp) -> FaucetResult<Amount> {
        check_claim_eligibility(&self.config, &self.record(&caller), now)?;
        self.ensure_not_pool(&caller)?;

        // Stamped before the funds check; discarded with everything else on abort.
        self.record_mut(&caller).last_claim_timestamp = now;

        let pool = self.pool;
        let amount = self.config.claim_amount;
        let available = self.assets.balance_of(&pool);
        if available < amount {
            return Err(FaucetError::InsufficientFaucetFunds { available, required: amount });
        }
        if !self.assets.debit(&pool, &caller, amount) {
            return Err(FaucetError::TransferFailed);
        }

        let record = self.record_mut(&caller);
        record.total_tokens_claimed = record
            .total_tokens_claimed
            .checked_add(amount)
            .ok_or(FaucetError::ArithmeticOverflow("total tokens claimed"))?;
        record.total_claims_made = record
            .total_claims_made
            .checked_add(1)
            .ok_or(FaucetError::ArithmeticOverflow("total claims made"))?;
        let record = *record;

        let referrer = self.referrer_of(&caller);
        self.emit(FaucetEvent::TokensClaimed(TokensClaimed {
            claimer: caller,
            amount,
            referrer,
            total_tokens_claimed: record.total_tokens_claimed,
            total_claims_made: record.total_claims_made,
            total_referral_claims_received: record.total_referral_claims_received,
        }));
        Ok(amount)
    }

    fn claim_with_referral(
        &mut self,
        caller: Address,
        referrer: Address,
        now: Timestamp,
    ) -> FaucetResult<ReferralPayout> {
        check_claim_eligibility(&self.config, &self.record(&caller), now)?;
        if referrer.is_zero() || referrer == caller || referrer == self.pool {
            return Err(FaucetError::InvalidReferrer);
        }
        self.ensure_not_pool(&caller)?;

        // First link wins. Payouts below follow the `referrer` argument even
        // when it differs from the stored link.
        if self.referrer_of(&caller).is_none() {
            self.referrals.insert(caller, referrer);
        }

        let claim_amount = self.config.claim_amount;
        let bonus = referral_bonus(claim_amount, self.config.referral_bonus_percent)?;
        let payout = claim_amount
            .checked_add(bonus)
            .ok_or(FaucetError::ArithmeticOverflow("referral payout"))?;

        let pool = self.pool;
        if !self.assets.debit(&pool, &caller, payout) {
            return Err(FaucetError::TransferFailed);
        }
        if !self.assets.debit(&pool, &referrer, bonus) {
            return Err(FaucetError::ReferrerTransferFailed);
        }

        let referrer_record = self.record_mut(&referrer);
        referrer_record.total_referral_claims_received = referrer_record
            .total_referral_claims_received
            .checked_add(1)
            .ok_or(FaucetError::ArithmeticOverflow("total referral claims received"))?;

        let record = self.record_mut(&caller);
        record.last_claim_timestamp = now;
        // Bonus is not counted towards the claimer's total.
        record.total_tokens_claimed = record
            .total_tokens_claimed
            .checked_add(claim_amount)
            .ok_or(FaucetError::ArithmeticOverflow("total tokens claimed"))?;
        record.total_claims_made = record
            .total_claims_made
            .checked_add(1)
            .ok_or(FaucetError::ArithmeticOverflow("total claims made"))?;
        let record = *record;

        self.emit(FaucetEvent::TokensClaimed(TokensClaimed {
            claimer: caller,
            amount: payout,
            referrer: Some(referrer),
            total_tokens_claimed: record.total_tokens_claimed,
            total_claims_made: record.total_claims_made,
            total_referral_claims_received: record.total_referral_claims_received,
        }));
        Ok(ReferralPayout { claimer_amount: payout, referrer_bonus: bonus })
    }

    fn owner_claim(&mut self, owner: Address, claimer: Address) -> FaucetResult<Amount> {
        ensure_not_paused(&self.config)?;
        ensure_not_blacklisted(&self.record(&claimer))?;
        if claimer.is_zero() || claimer == owner {
            return Err(FaucetError::InvalidClaimer);
        }
        self.ensure_not_pool(&claimer)?;

        let pool = self.pool;
        let amount = self.config.claim_amount;
        if !self.assets.debit(&pool, &claimer, amount) {
            return Err(FaucetError::TransferFailed);
        }
        // No record counters and no TokensClaimed fact for owner claims.
        Ok(amount)
    }

    fn deposit(&mut self, from: Address, amount: Amount) -> FaucetResult<()> {
        let pool = self.pool;
        if !self.assets.credit(&from, &pool, amount) {
            return Err(FaucetError::DepositFailed);
        }
        Ok(())
    }

    fn toggle_pause(&mut self) -> bool {
        self.config.paused = !self.config.paused;
        let paused = self.config.paused;
        self.emit(FaucetEvent::PauseStatus { paused });
        paused
    }

    fn withdraw_all(&mut self, to: Address) -> FaucetResult<Withdrawal> {
        let pool = self.pool;

        let native = self.assets.native_balance_of(&pool);
        if !self.assets.transfer_native(&pool, &to, native) {
            return Err(FaucetError::NativeWithdrawalFailed);
        }

        let tokens = self.assets.balance_of(&pool);
        if !self.assets.debit(&pool, &to, tokens) {
            return Err(FaucetError::WithdrawalFailed);
        }
        Ok(Withdrawal { native, tokens })
    }
}

/// Token faucet with cooldowns, referral bonuses and owner controls.
pub struct FaucetLedger<A: AssetLedger, C: AccessControl> {
    state: FaucetState,
    pool: Address,
    assets: A,
    access: C,
    events: Vec<FaucetEvent>,
}

impl<A: AssetLedger, C: AccessControl> FaucetLedger<A, C> {
    /// Create a ledger paying out of `pool`'s balance on `assets`.
    pub fn new(config: FaucetConfig, pool: Address, assets: A, access: C) -> Self {
        info!(
            "Faucet ledger created for pool {}: claim_amount={}, frequency={}s, referral_bonus={}%, paused={}",
            pool, config.claim_amount, config.claim_frequency_secs, config.referral_bonus_percent, config.paused
        );
        Self {
            state: FaucetState::new(config),
            pool,
            assets,
            access,
            events: Vec::new(),
        }
    }

    /// Run `body` against a staged view and commit only if it succeeds.
    fn execute<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut Staged<'_, A>) -> FaucetResult<T>,
    ) -> FaucetResult<T> {
        let checkpoint = self.assets.checkpoint();
        let mut staged = Staged::new(&self.state, &mut self.assets, self.pool);

        match body(&mut staged) {
            Ok(value) => {
                let writes = staged.into_writes();
                self.state.apply(writes.config, writes.records, writes.referrals);
                self.events.extend(writes.events);
                self.assets.release(checkpoint);
                Ok(value)
            }
            Err(err) => {
                drop(staged);
                self.assets.rollback(checkpoint);
                log_rejection(operation, &err);
                Err(err)
            }
        }
    }

    fn require_owner(&self, caller: &Address, operation: &'static str) -> FaucetResult<()> {
        if !self.access.is_owner(caller) {
            let err = FaucetError::NotOwner;
            log_rejection(operation, &err);
            return Err(err);
        }
        Ok(())
    }

    // --- Claims ---

    /// Self-service claim of `claim_amount` tokens.
    pub fn claim(&mut self, caller: Address, now: Timestamp) -> FaucetResult<Amount> {
        let amount = self.execute("claim", |tx| tx.claim(caller, now))?;
        info!("Tokens claimed by {}: {} at {}", caller, amount, now);
        Ok(amount)
    }

    /// Claim that also pays `referrer` a bonus of `referral_bonus_percent`.
    ///
    /// The claimer's stored referral link is set on the first referral claim
    /// and never changes afterwards, but the bonus always goes to the
    /// `referrer` passed in.
    pub fn claim_with_referral(
        &mut self,
        caller: Address,
        referrer: Address,
        now: Timestamp,
    ) -> FaucetResult<ReferralPayout> {
        let payout = self.execute("claim_with_referral", |tx| {
            tx.claim_with_referral(caller, referrer, now)
        })?;
        if let Some(linked) = self.state.referrer_of(&caller) {
            if linked != referrer {
                warn!("Referral for {} paid to {} but stored link is {}", caller, referrer, linked);
            }
        }
        info!(
            "Tokens claimed by {} with referral from {}: {} (bonus {})",
            caller, referrer, payout.claimer_amount, payout.referrer_bonus
        );
        Ok(payout)
    }

    /// Owner sends one `claim_amount` to `claimer`, bypassing the cooldown.
    pub fn owner_claim(&mut self, owner: Address, claimer: Address) -> FaucetResult<Amount> {
        self.require_owner(&owner, "owner_claim")?;
        let amount = self.execute("owner_claim", |tx| tx.owner_claim(owner, claimer))?;
        info!("Owner claim dispensed to {}: {}", claimer, amount);
        Ok(amount)
    }

    // --- Administration ---

    /// Move `amount` tokens from the owner into the pool.
    pub fn deposit(&mut self, caller: Address, amount: Amount) -> FaucetResult<()> {
        self.require_owner(&caller, "deposit")?;
        self.execute("deposit", |tx| tx.deposit(caller, amount))?;
        info!("Pool funded with {}", amount);
        Ok(())
    }

    pub fn set_claim_amount(&mut self, caller: Address, amount: Amount) -> FaucetResult<()> {
        self.require_owner(&caller, "set_claim_amount")?;
        self.execute("set_claim_amount", |tx| {
            tx.config.claim_amount = amount;
            Ok(())
        })?;
        info!("Claim amount updated to {}", amount);
        Ok(())
    }

    /// Seconds between claims. Zero disables self-service claims.
    pub fn set_claim_frequency(&mut self, caller: Address, seconds: u64) -> FaucetResult<()> {
        self.require_owner(&caller, "set_claim_frequency")?;
        self.execute("set_claim_frequency", |tx| {
            tx.config.claim_frequency_secs = seconds;
            Ok(())
        })?;
        info!("Claim frequency updated to {}s", seconds);
        Ok(())
    }

    /// No upper bound: above 100 the bonus exceeds the claim amount.
    pub fn set_referral_bonus_percent(&mut self, caller: Address, percent: u64) -> FaucetResult<()> {
        self.require_owner(&caller, "set_referral_bonus_percent")?;
        self.execute("set_referral_bonus_percent", |tx| {
            tx.config.referral_bonus_percent = percent;
            Ok(())
        })?;
        if percent > 100 {
            warn!("Referral bonus set to {}%, exceeding the claim amount", percent);
        } else {
            info!("Referral bonus updated to {}%", percent);
        }
        Ok(())
    }

    /// Flip the pause flag and return the new value.
    pub fn toggle_pause(&mut self, caller: Address) -> FaucetResult<bool> {
        self.require_owner(&caller, "toggle_pause")?;
        let paused = self.execute("toggle_pause", |tx| Ok(tx.toggle_pause()))?;
        info!("Pause status changed: paused={}", paused);
        Ok(paused)
    }

    pub fn blacklist(&mut self, caller: Address, address: Address) -> FaucetResult<()> {
        self.set_blacklisted(caller, address, true)
    }

    pub fn unblacklist(&mut self, caller: Address, address: Address) -> FaucetResult<()> {
        self.set_blacklisted(caller, address, false)
    }

    fn set_blacklisted(&mut self, caller: Address, address: Address, flag: bool) -> FaucetResult<()> {
        let operation = if flag { "blacklist" } else { "unblacklist" };
        self.require_owner(&caller, operation)?;
        self.execute(operation, |tx| {
            tx.record_mut(&address).blacklisted = flag;
            Ok(())
        })?;
        info!("Blacklist updated for {}: {}", address, flag);
        Ok(())
    }

    /// Send the pool's whole native balance, then its whole token balance,
    /// to the owner.
    pub fn withdraw_all(&mut self, caller: Address) -> FaucetResult<Withdrawal> {
        self.require_owner(&caller, "withdraw_all")?;
        let withdrawal = self.execute("withdraw_all", |tx| tx.withdraw_all(caller))?;
        info!("Pool drained to owner: native={}, tokens={}", withdrawal.native, withdrawal.tokens);
        Ok(withdrawal)
    }

    // --- Queries ---

    pub fn total_tokens_claimed(&self, address: &Address) -> Amount {
        self.state.record(address).total_tokens_claimed
    }

    pub fn total_claims_made(&self, address: &Address) -> u64 {
        self.state.record(address).total_claims_made
    }

    pub fn total_referral_claims_received(&self, address: &Address) -> u64 {
        self.state.record(address).total_referral_claims_received
    }

    /// Token balance of the pool.
    pub fn faucet_balance(&self) -> Amount {
        self.assets.balance_of(&self.pool)
    }

    pub fn native_balance(&self) -> Amount {
        self.assets.native_balance_of(&self.pool)
    }

    pub fn claimer_record(&self, address: &Address) -> ClaimerRecord {
        self.state.record(address)
    }

    pub fn referrer_of(&self, claimer: &Address) -> Option<Address> {
        self.state.referrer_of(claimer)
    }

    /// Earliest timestamp at which `address` passes the cooldown guard.
    /// `Ok(None)` while claiming is disabled; `ArithmeticOverflow` when the
    /// cooldown ends past the last representable timestamp.
    pub fn next_claim_at(&self, address: &Address) -> FaucetResult<Option<Timestamp>> {
        guards::next_claim_at(&self.state.config, &self.state.record(address))
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.state.config
    }

    pub fn state(&self) -> &FaucetState {
        &self.state
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// Direct access to the asset ledger, for hosts that fund accounts
    /// outside of faucet operations.
    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    /// Facts emitted by committed operations since the last call.
    pub fn take_events(&mut self) -> Vec<FaucetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[FaucetEvent] {
        &self.events
    }
}

fn log_rejection(operation: &'static str, err: &FaucetError) {
    match err.category() {
        ErrorCategory::Guard => debug!("{} rejected [{}]: {}", operation, err.code(), err),
        _ => warn!("{} rejected [{}]: {}", operation, err.code(), err),
    }
}

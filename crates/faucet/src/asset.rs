//! Asset ledger capability consumed by the faucet, plus an in-memory
//! implementation used by the service binary and the tests.

use drip_common::types::{Address, Amount};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Balances and transfers of the dispensed token and of the host's native
/// currency.
///
/// Transfer methods report failure by returning `false`; the faucet treats
/// that exactly like a thrown error. `checkpoint`/`rollback` are the host's
/// savepoint mechanism: everything applied after a checkpoint is undone by
/// rolling back to it.
pub trait AssetLedger {
    type Checkpoint;

    /// Token balance of `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;

    /// Move tokens out of the pool to `to`.
    fn debit(&mut self, pool: &Address, to: &Address, amount: Amount) -> bool;

    /// Move tokens from `from` into the pool.
    fn credit(&mut self, from: &Address, pool: &Address, amount: Amount) -> bool;

    fn native_balance_of(&self, holder: &Address) -> Amount;

    fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> bool;

    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Undo every movement applied since `checkpoint`.
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Movements since `checkpoint` are final. Default does nothing.
    fn release(&mut self, _checkpoint: Self::Checkpoint) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Asset {
    Token,
    Native,
}

#[derive(Debug, Clone, Copy)]
enum JournalEntry {
    Transfer { asset: Asset, from: Address, to: Address, amount: Amount },
    Mint { asset: Asset, to: Address, amount: Amount },
}

/// HashMap-backed ledger with an undo journal.
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    tokens: HashMap<Address, Amount>,
    native: HashMap<Address, Amount>,
    journal: Vec<JournalEntry>,
    /// Recipients whose incoming transfers are refused
    rejecting: HashSet<Address>,
    /// Recipients refusing token transfers only
    rejecting_tokens: HashSet<Address>,
    /// Checkpoints taken and not yet rolled back or released
    open_checkpoints: usize,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens out of thin air for `to`.
    pub fn mint(&mut self, to: &Address, amount: Amount) {
        self.add(Asset::Token, to, amount);
        self.record(JournalEntry::Mint { asset: Asset::Token, to: *to, amount });
    }

    /// Give `to` native currency.
    pub fn fund_native(&mut self, to: &Address, amount: Amount) {
        self.add(Asset::Native, to, amount);
        self.record(JournalEntry::Mint { asset: Asset::Native, to: *to, amount });
    }

    /// Refuse every incoming transfer to `address`, token or native.
    pub fn fail_transfers_to(&mut self, address: Address) {
        self.rejecting.insert(address);
    }

    /// Refuse incoming token transfers to `address`; native transfers still go through.
    pub fn fail_token_transfers_to(&mut self, address: Address) {
        self.rejecting_tokens.insert(address);
    }

    pub fn accept_transfers_to(&mut self, address: &Address) {
        self.rejecting.remove(address);
        self.rejecting_tokens.remove(address);
    }

    fn refuses(&self, asset: Asset, to: &Address) -> bool {
        self.rejecting.contains(to) || (asset == Asset::Token && self.rejecting_tokens.contains(to))
    }

    /// Number of journal entries still held for rollback.
    pub fn pending_journal_len(&self) -> usize {
        self.journal.len()
    }

    /// History is only needed while a checkpoint is open.
    fn record(&mut self, entry: JournalEntry) {
        if self.open_checkpoints > 0 {
            self.journal.push(entry);
        }
    }

    fn balances(&self, asset: Asset) -> &HashMap<Address, Amount> {
        match asset {
            Asset::Token => &self.tokens,
            Asset::Native => &self.native,
        }
    }

    fn balances_mut(&mut self, asset: Asset) -> &mut HashMap<Address, Amount> {
        match asset {
            Asset::Token => &mut self.tokens,
            Asset::Native => &mut self.native,
        }
    }

    fn add(&mut self, asset: Asset, to: &Address, amount: Amount) {
        let balance = self.balances_mut(asset).entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn sub(&mut self, asset: Asset, from: &Address, amount: Amount) {
        let balance = self.balances_mut(asset).entry(*from).or_insert(0);
        *balance = balance.saturating_sub(amount);
    }

    fn transfer(&mut self, asset: Asset, from: &Address, to: &Address, amount: Amount) -> bool {
        if self.refuses(asset, to) {
            debug!(?asset, %from, %to, amount, "Transfer refused by recipient");
            return false;
        }

        let available = self.balances(asset).get(from).copied().unwrap_or(0);
        if available < amount {
            debug!(?asset, %from, %to, amount, available, "Transfer exceeds balance");
            return false;
        }
        let receiving = self.balances(asset).get(to).copied().unwrap_or(0);
        if from != to && receiving.checked_add(amount).is_none() {
            return false;
        }

        self.sub(asset, from, amount);
        self.add(asset, to, amount);
        self.record(JournalEntry::Transfer { asset, from: *from, to: *to, amount });
        trace!(?asset, %from, %to, amount, "Transfer applied");
        true
    }

    fn close_checkpoint(&mut self) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }
}

impl AssetLedger for InMemoryAssetLedger {
    type Checkpoint = usize;

    fn balance_of(&self, holder: &Address) -> Amount {
        self.tokens.get(holder).copied().unwrap_or(0)
    }

    fn debit(&mut self, pool: &Address, to: &Address, amount: Amount) -> bool {
        self.transfer(Asset::Token, pool, to, amount)
    }

    fn credit(&mut self, from: &Address, pool: &Address, amount: Amount) -> bool {
        self.transfer(Asset::Token, from, pool, amount)
    }

    fn native_balance_of(&self, holder: &Address) -> Amount {
        self.native.get(holder).copied().unwrap_or(0)
    }

    fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> bool {
        self.transfer(Asset::Native, from, to, amount)
    }

    fn checkpoint(&mut self) -> usize {
        self.open_checkpoints += 1;
        self.journal.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            let Some(entry) = self.journal.pop() else { break };
            match entry {
                JournalEntry::Transfer { asset, from, to, amount } => {
                    self.sub(asset, &to, amount);
                    self.add(asset, &from, amount);
                }
                JournalEntry::Mint { asset, to, amount } => self.sub(asset, &to, amount),
            }
        }
        self.close_checkpoint();
    }

    fn release(&mut self, _checkpoint: usize) {
        self.close_checkpoint();
    }
}

//! Rent transaction processor.
//!
//! Every rent-affecting trigger follows the same shape: settle the owed
//! rent, apply the mutation, reschedule. State is passed in explicitly and
//! every write goes through [`WorldState`], so the ledger and the eviction
//! schedule change together and a transaction revert undoes both.
//!
//! Before the upgrade block the rent hooks are inert: plain value, code and
//! storage effects still apply, but records keep the `rent_last_paid == 0`
//! sentinel until they are migrated.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, trace};

use rent_accrual::migrate;
use rent_core::error::RentError;
use rent_core::ledger::{Account, RentRecord};
use rent_core::params::RentParams;
use rent_core::traits::RentCalculator;
use rent_core::types::{Address, Word};

use crate::state::WorldState;

/// Accounts removed by [`RentProcessor::finalize_touched`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Removed because their rent horizon had passed.
    pub evicted: Vec<Address>,
    /// Removed because they were empty.
    pub removed_empty: Vec<Address>,
}

impl FinalizeReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.removed_empty.is_empty()
    }
}

/// Applies the rent triggers to a [`WorldState`].
#[derive(Clone)]
pub struct RentProcessor {
    calc: Arc<dyn RentCalculator>,
}

impl RentProcessor {
    pub fn new(calc: Arc<dyn RentCalculator>) -> Self {
        Self { calc }
    }

    pub fn calculator(&self) -> &dyn RentCalculator {
        self.calc.as_ref()
    }

    pub fn params(&self) -> &RentParams {
        self.calc.params()
    }

    fn is_active(&self, block: u64) -> bool {
        self.params().is_active(block)
    }

    /// Record for an account that did not exist before `block`.
    fn fresh_record(&self, block: u64) -> RentRecord {
        if self.is_active(block) {
            RentRecord::derive(self.calculator(), 0, block, 0, 0)
        } else {
            RentRecord::unsettled(self.calculator(), 0, 0)
        }
    }

    /// Migrate if needed, then settle to `block`.
    fn settle(&self, record: &RentRecord, block: u64) -> RentRecord {
        let migrated = migrate(self.calculator(), record, self.params().upgrade_block);
        let settlement = self.calc.settle(&migrated, block);
        if settlement.charged > 0 {
            trace!(block, charged = settlement.charged, "settled rent");
        }
        settlement.record
    }

    fn top_up(&self, record: RentRecord) -> RentRecord {
        let stipend = self.params().stipend;
        if record.rent_balance() < stipend {
            record.with_rent_balance(self.calculator(), stipend)
        } else {
            record
        }
    }

    /// Load `address` settled to `block`, or a fresh account if absent.
    ///
    /// Returns the account and whether it already existed.
    fn load(&self, state: &WorldState, address: &Address, block: u64) -> (Account, bool) {
        match state.account(address) {
            Some(existing) => {
                let mut account = existing.clone();
                if self.is_active(block) {
                    let settled = self.settle(account.rent(), block);
                    account.set_rent(settled);
                }
                (account, true)
            }
            None => (Account::with_rent(self.fresh_record(block)), false),
        }
    }

    /// Storage write trigger.
    ///
    /// Settles, tops the rent balance up to the stipend, writes the slot and
    /// adjusts the storage word count on zero transitions. Returns the
    /// previous slot value.
    pub fn on_storage_write(
        &self,
        state: &mut WorldState,
        address: Address,
        key: Word,
        value: Word,
        block: u64,
    ) -> Word {
        let (mut account, _) = self.load(state, &address, block);
        let mut rent = account.rent().clone();
        if self.is_active(block) {
            rent = self.top_up(rent);
        }

        let previous = state.set_storage(address, key, value);
        let words = rent.storage_word_count();
        let words = match (previous.is_zero(), value.is_zero()) {
            (true, false) => words.saturating_add(1),
            (false, true) => words.saturating_sub(1),
            _ => words,
        };
        account.set_rent(rent.with_storage_words(self.calculator(), words));
        state.put_account(address, account);
        previous
    }

    /// Value receipt trigger, run for the recipient of a non-zero transfer.
    ///
    /// An absent recipient is created with the stipend. The value itself is
    /// credited by the caller.
    pub fn on_value_transfer(&self, state: &mut WorldState, address: Address, amount: u64, block: u64) {
        if amount == 0 {
            return;
        }
        let (mut account, existed) = self.load(state, &address, block);
        if !existed && self.is_active(block) {
            account.set_rent(self.top_up(account.rent().clone()));
            debug!(%address, block, "activated account on first funding");
        }
        state.put_account(address, account);
    }

    /// Account creation (code deployment) trigger.
    ///
    /// Raises the rent balance to at least the stipend, keeping a higher
    /// existing balance, and marks rent as paid up to `block`.
    pub fn on_account_create(&self, state: &mut WorldState, address: Address, block: u64) {
        let (mut account, _) = self.load(state, &address, block);
        if self.is_active(block) {
            let rent = self
                .top_up(account.rent().clone())
                .with_last_paid(self.calculator(), block);
            account.set_rent(rent);
        }
        state.put_account(address, account);
    }

    /// Move `amount` from `payer`'s spendable balance into `recipient`'s rent balance.
    ///
    /// Does not settle. The recipient's eviction block is recomputed from
    /// its unchanged `rent_last_paid`. Nothing is written on failure.
    pub fn on_direct_payment(
        &self,
        state: &mut WorldState,
        payer: Address,
        recipient: Address,
        amount: u64,
        block: u64,
    ) -> Result<(), RentError> {
        let target = state
            .account(&recipient)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| RentError::UnknownRecipient(recipient.to_string()))?;

        let have = state.account(&payer).map_or(0, |a| a.balance);
        if have < amount {
            return Err(RentError::InsufficientFunds { have, need: amount });
        }

        let rent = if self.is_active(block) {
            migrate(self.calculator(), target.rent(), self.params().upgrade_block)
        } else {
            target.rent().clone()
        };
        let credited = rent
            .rent_balance()
            .checked_add(amount)
            .ok_or(RentError::ValueOverflow)?;

        if let Some(mut source) = state.account(&payer).cloned() {
            source.balance -= amount;
            state.put_account(payer, source);
        }
        // Re-read: payer and recipient may be the same account.
        if let Some(mut target) = state.account(&recipient).cloned() {
            target.set_rent(rent.with_rent_balance(self.calculator(), credited));
            state.put_account(recipient, target);
        }

        trace!(%payer, %recipient, amount, "direct rent payment");
        Ok(())
    }

    /// Stored rent balance of `address`. Never settles.
    pub fn rent_balance_of(&self, state: &WorldState, address: &Address) -> u64 {
        state.account(address).map_or(0, |a| a.rent().rent_balance())
    }

    /// Whether `address` may be evicted at `block`.
    pub fn is_evictable(&self, state: &WorldState, address: &Address, block: u64) -> bool {
        if !self.is_active(block) {
            return false;
        }
        state.account(address).is_some_and(|a| {
            self.params()
                .eviction_boundary
                .is_evictable(block, a.rent().rent_evict_block())
        })
    }

    /// Destroy an account: balance, code, storage, rent fields and schedule entry.
    pub fn evict(&self, state: &mut WorldState, address: &Address, block: u64) -> Option<Account> {
        let evicted = state.remove_account(address)?;
        debug!(
            %address,
            block,
            evict_block = %evicted.rent().rent_evict_block(),
            "evicted account"
        );
        Some(evicted)
    }

    /// Migrate `address` if it still carries the sentinel. Does not settle.
    fn migrate_account(&self, state: &mut WorldState, address: &Address) -> bool {
        let Some(mut account) = state
            .account(address)
            .filter(|a| a.rent().is_unsettled())
            .cloned()
        else {
            return false;
        };
        let migrated = migrate(self.calculator(), account.rent(), self.params().upgrade_block);
        account.set_rent(migrated);
        state.put_account(*address, account);
        true
    }

    /// Apply the end-of-transaction rule to every touched account.
    ///
    /// Once rent is active, a touched account still carrying the sentinel is
    /// migrated first, whether or not a trigger reached it. Evictable
    /// accounts are then evicted; otherwise empty accounts are removed.
    /// Accounts are visited in address order.
    pub fn finalize_touched(
        &self,
        state: &mut WorldState,
        touched: &BTreeSet<Address>,
        block: u64,
    ) -> FinalizeReport {
        let mut report = FinalizeReport::default();
        let active = self.is_active(block);
        for address in touched {
            if active && self.migrate_account(state, address) {
                trace!(%address, block, "migrated on touch");
            }
            if self.is_evictable(state, address, block) {
                if self.evict(state, address, block).is_some() {
                    report.evicted.push(*address);
                }
            } else if state.account(address).is_some_and(Account::is_empty) {
                state.remove_account(address);
                trace!(%address, "removed empty account");
                report.removed_empty.push(*address);
            }
        }
        report
    }

    /// Accounts whose horizon has passed at `block`.
    ///
    /// Maintenance hint only: nothing is removed, and untouched accounts
    /// remain in consensus state until their next touch.
    pub fn due_by(&self, state: &WorldState, block: u64) -> Vec<Address> {
        if !self.is_active(block) {
            return Vec::new();
        }
        match self.params().eviction_boundary.sweep_horizon(block) {
            Some(horizon) => state.scheduler().due_by(horizon).collect(),
            None => Vec::new(),
        }
    }

    /// Migrate every account still carrying the sentinel. Returns how many.
    pub fn migrate_all(&self, state: &mut WorldState) -> usize {
        let upgrade_block = self.params().upgrade_block;
        let pending = state.ledger().unsettled_addresses();
        let mut count = 0;
        for address in pending {
            if self.migrate_account(state, &address) {
                count += 1;
            }
        }
        debug!(count, upgrade_block, "migrated accounts into rent regime");
        count
    }
}

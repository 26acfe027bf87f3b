//! World state: account ledger, eviction schedule and storage slots under
//! one undo journal.
//!
//! Every write goes through [`WorldState`], which records the previous value
//! before applying it. Reverting to a [`Checkpoint`] replays those records
//! in reverse, restoring accounts, storage slots and, because the schedule
//! is re-derived from each restored record, the eviction schedule too.

use std::collections::{BTreeMap, BTreeSet};

use rent_core::ledger::{hash_account, Account, AccountLedger};
use rent_core::scheduler::EvictionScheduler;
use rent_core::types::{Address, Word};

/// Largest storage key. Upper bound for per-account slot scans.
const MAX_KEY: Word = Word([0xFF; 32]);

/// Undo record for a single write.
#[derive(Clone, Debug)]
enum JournalEntry {
    Account {
        address: Address,
        previous: Option<Account>,
    },
    Slot {
        address: Address,
        key: Word,
        previous: Word,
    },
}

/// Position in the undo journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// Keys written since the last [`WorldState::take_dirty`].
///
/// A superset of what actually changed: reverted writes stay listed and are
/// persisted with their restored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    pub accounts: Vec<Address>,
    pub slots: Vec<(Address, Word)>,
}

impl DirtySet {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.slots.is_empty()
    }
}

/// Ledger, schedule and storage, kept consistent with each other.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    ledger: AccountLedger,
    scheduler: EvictionScheduler,
    /// Non-zero slots only. A zero value is never stored.
    storage: BTreeMap<(Address, Word), Word>,
    journal: Vec<JournalEntry>,
    dirty_accounts: BTreeSet<Address>,
    dirty_slots: BTreeSet<(Address, Word)>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state from loaded accounts and slots.
    ///
    /// The schedule is derived from the ledger; nothing is marked dirty.
    pub fn from_parts(ledger: AccountLedger, storage: BTreeMap<(Address, Word), Word>) -> Self {
        let mut scheduler = EvictionScheduler::new();
        for (address, account) in ledger.iter() {
            scheduler.upsert(*address, account.rent().rent_evict_block());
        }
        let storage = storage.into_iter().filter(|(_, v)| !v.is_zero()).collect();
        Self {
            ledger,
            scheduler,
            storage,
            ..Self::default()
        }
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn scheduler(&self) -> &EvictionScheduler {
        &self.scheduler
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.ledger.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.ledger.contains(address)
    }

    /// Insert or replace an account and reschedule it.
    pub fn put_account(&mut self, address: Address, account: Account) {
        let evict = account.rent().rent_evict_block();
        let previous = self.ledger.insert(address, account);
        self.scheduler.upsert(address, evict);
        self.journal.push(JournalEntry::Account { address, previous });
        self.dirty_accounts.insert(address);
    }

    /// Remove an account together with all of its storage slots.
    pub fn remove_account(&mut self, address: &Address) -> Option<Account> {
        if !self.ledger.contains(address) {
            return None;
        }
        let keys: Vec<Word> = self.storage_of(address).map(|(k, _)| k).collect();
        for key in keys {
            self.set_storage(*address, key, Word::ZERO);
        }

        let previous = self.ledger.remove(address)?;
        self.scheduler.remove(address);
        self.journal.push(JournalEntry::Account {
            address: *address,
            previous: Some(previous.clone()),
        });
        self.dirty_accounts.insert(*address);
        Some(previous)
    }

    /// Value of a storage slot; zero when unset.
    pub fn storage(&self, address: &Address, key: &Word) -> Word {
        self.storage
            .get(&(*address, *key))
            .copied()
            .unwrap_or(Word::ZERO)
    }

    /// Write a storage slot, returning the previous value.
    ///
    /// Writing zero clears the slot. Word counts are the caller's concern.
    pub fn set_storage(&mut self, address: Address, key: Word, value: Word) -> Word {
        let previous = if value.is_zero() {
            self.storage.remove(&(address, key))
        } else {
            self.storage.insert((address, key), value)
        }
        .unwrap_or(Word::ZERO);

        if previous != value {
            self.journal.push(JournalEntry::Slot {
                address,
                key,
                previous,
            });
            self.dirty_slots.insert((address, key));
        }
        previous
    }

    /// Non-zero slots of one account in key order.
    pub fn storage_of(&self, address: &Address) -> impl Iterator<Item = (Word, Word)> + '_ {
        self.storage
            .range((*address, Word::ZERO)..=(*address, MAX_KEY))
            .map(|((_, k), v)| (*k, *v))
    }

    /// Number of non-zero slots across all accounts.
    pub fn slot_count(&self) -> usize {
        self.storage.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Undo every write made since `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Account { address, previous } => {
                    match previous {
                        Some(account) => {
                            self.scheduler
                                .upsert(address, account.rent().rent_evict_block());
                            self.ledger.insert(address, account);
                        }
                        None => {
                            self.scheduler.remove(&address);
                            self.ledger.remove(&address);
                        }
                    }
                    self.dirty_accounts.insert(address);
                }
                JournalEntry::Slot {
                    address,
                    key,
                    previous,
                } => {
                    if previous.is_zero() {
                        self.storage.remove(&(address, key));
                    } else {
                        self.storage.insert((address, key), previous);
                    }
                    self.dirty_slots.insert((address, key));
                }
            }
        }
    }

    /// Accept the writes made since `checkpoint`.
    ///
    /// Entries are only dropped for the outermost checkpoint; an inner
    /// commit leaves them in place so an enclosing revert still undoes them.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        if checkpoint.0 == 0 {
            self.journal.clear();
        }
    }

    /// Number of pending undo records.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Put back a set drained by [`take_dirty`](Self::take_dirty) so a
    /// later call lists those keys again.
    pub fn restore_dirty(&mut self, dirty: DirtySet) {
        self.dirty_accounts.extend(dirty.accounts);
        self.dirty_slots.extend(dirty.slots);
    }

    /// Drain the set of keys written since the previous call.
    pub fn take_dirty(&mut self) -> DirtySet {
        DirtySet {
            accounts: std::mem::take(&mut self.dirty_accounts).into_iter().collect(),
            slots: std::mem::take(&mut self.dirty_slots).into_iter().collect(),
        }
    }

    /// BLAKE3 commitment over all accounts followed by all non-zero slots.
    ///
    /// Accounts use the ledger's canonical layout; each slot is
    /// `address || key || value`. Both sections are in key order.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for (address, account) in self.ledger.iter() {
            hash_account(&mut hasher, address, account);
        }
        for ((address, key), value) in &self.storage {
            hasher.update(address.as_bytes());
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }
        hasher.finalize().into()
    }
}

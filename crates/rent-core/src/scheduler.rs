//! Eviction schedule: which accounts become evictable at which block.
//!
//! The scheduler provides:
//! - O(1) lookup of an account's scheduled block via an address index
//! - O(log n) replacement when an account's eviction block changes
//! - `due_by(n)` in time proportional to the number of due accounts, via an
//!   index ordered by `(evict_block, address)`
//!
//! Both indices are updated inside the same `&mut self` call, so no reader
//! can observe one of them ahead of the other. The scheduler only mirrors
//! the ledger's `rent_evict_block`; the ledger remains authoritative.

use std::collections::btree_set;
use std::collections::{BTreeSet, HashMap};

use crate::types::{Address, EvictBlock};

/// Dual-indexed eviction schedule.
///
/// Holds exactly one entry per account with a finite eviction block.
#[derive(Clone, Debug, Default)]
pub struct EvictionScheduler {
    /// Address → scheduled eviction block.
    by_address: HashMap<Address, u64>,
    /// Sweep order: ascending block, ties broken by ascending address.
    by_block: BTreeSet<(u64, Address)>,
}

impl EvictionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `address` at `evict`, replacing any earlier entry.
    ///
    /// `EvictBlock::Never` removes the address. Returns the previously
    /// scheduled block, if any.
    pub fn upsert(&mut self, address: Address, evict: EvictBlock) -> Option<u64> {
        let previous = self.remove(&address);
        if let EvictBlock::At(block) = evict {
            self.by_address.insert(address, block);
            self.by_block.insert((block, address));
        }
        previous
    }

    /// Drop `address` from the schedule. Returns its block, if it was scheduled.
    pub fn remove(&mut self, address: &Address) -> Option<u64> {
        let block = self.by_address.remove(address)?;
        self.by_block.remove(&(block, *address));
        Some(block)
    }

    /// Scheduled eviction block of `address`; `Never` when absent.
    pub fn evict_block(&self, address: &Address) -> EvictBlock {
        self.by_address
            .get(address)
            .map_or(EvictBlock::Never, |b| EvictBlock::At(*b))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Addresses whose eviction block is `<= block`, in `(evict_block, address)` order.
    ///
    /// The iterator borrows the schedule and removes nothing; call
    /// [`remove`](Self::remove) for each entry acted upon. Calling again
    /// recomputes the sequence from the current state.
    pub fn due_by(&self, block: u64) -> DueBy<'_> {
        DueBy {
            inner: self.by_block.range(..=(block, Address::MAX)),
        }
    }

    /// The earliest scheduled entry.
    pub fn next_due(&self) -> Option<(u64, Address)> {
        self.by_block.first().copied()
    }

    /// All entries in sweep order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Address)> + '_ {
        self.by_block.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

/// Lazy sequence returned by [`EvictionScheduler::due_by`].
pub struct DueBy<'a> {
    inner: btree_set::Range<'a, (u64, Address)>,
}

impl Iterator for DueBy<'_> {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, address)| *address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

//! Trait interfaces for rent accounting.
//!
//! - [`RentCalculator`]: accrual and eviction-horizon math (rent-accrual implements)

use crate::ledger::RentRecord;
use crate::params::RentParams;
use crate::types::EvictBlock;

/// Result of settling an account's rent at a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// The record after settlement.
    pub record: RentRecord,
    /// Rent actually deducted (after clamping at the available balance).
    pub charged: u64,
}

/// Pure computation of rent accrual and eviction horizons.
///
/// All arithmetic is integer-only and saturating so that independent
/// implementations agree bit for bit. Implemented by the rent engine
/// (rent-accrual).
pub trait RentCalculator: Send + Sync {
    /// The schedule this calculator charges by.
    fn params(&self) -> &RentParams;

    /// Per-block rent for an account with the given code and storage size.
    fn cost_per_block(&self, code_words: u64, storage_words: u64) -> u64;

    /// Rent owed for `blocks` blocks at `cost_per_block`, saturated to `u64::MAX`.
    fn rent_due(&self, cost_per_block: u64, blocks: u64) -> u64;

    /// First block at which an account with this state becomes evictable.
    ///
    /// Default implementation: `rent_last_paid + rent_balance / cost_per_block`,
    /// or `Never` when the cost is zero. Records still carrying the
    /// `rent_last_paid == 0` sentinel have no horizon until they are migrated.
    fn eviction_block(&self, rent_last_paid: u64, rent_balance: u64, cost_per_block: u64) -> EvictBlock {
        if rent_last_paid == 0 || cost_per_block == 0 {
            return EvictBlock::Never;
        }
        EvictBlock::At(rent_last_paid.saturating_add(rent_balance / cost_per_block))
    }

    /// Settle the rent owed between `record.rent_last_paid()` and `current_block`.
    ///
    /// `current_block` must not be below `rent_last_paid`. Settling twice at
    /// the same block charges nothing the second time.
    fn settle(&self, record: &RentRecord, current_block: u64) -> Settlement;
}

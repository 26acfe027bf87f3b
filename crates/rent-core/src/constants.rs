//! Protocol constants. All monetary values are in base value units.

use crate::types::{Address, EvictionBoundary};

/// Size of a code or storage word in bytes.
pub const WORD_SIZE: u64 = 32;

/// Flat per-block rent charged to every account that has entered the rent regime.
pub const RENT_ACCOUNT_COST: u64 = 4_000;

/// Per-block rent for each word of code and each non-zero storage slot.
pub const RENT_WORD_COST: u64 = 250;

/// Minimum rent balance granted when an account is activated
/// (first funding, code deployment, storage write).
///
/// Covers 10,000 blocks for a bare account.
pub const RENT_STIPEND: u64 = 10_000 * RENT_ACCOUNT_COST;

/// Blocks of rent granted to pre-existing accounts at the upgrade boundary.
pub const MIGRATION_GRACE_BLOCKS: u64 = 2_102_400;

/// Default block at which rent accounting activates.
///
/// Must be non-zero: `rent_last_paid == 0` is the "never settled" sentinel.
pub const DEFAULT_UPGRADE_BLOCK: u64 = 1;

/// Eviction-boundary comparison in force when nothing else is configured.
///
/// Whether an account is already evictable at its eviction block or only at
/// the block after is an open protocol question. Every comparison goes
/// through [`EvictionBoundary`], so changing this value is the whole fix.
pub const EVICTION_BOUNDARY: EvictionBoundary = EvictionBoundary::Inclusive;

/// Gas for `RENTBALANCE` (balance-query tier).
pub const GAS_BALANCE_TIER: u64 = 400;

/// Gas for `SENDRENT` (base-op tier).
pub const GAS_BASE_TIER: u64 = 2;

/// Flat fee charged by the rent precompile.
pub const RENT_PRECOMPILE_FEE: u64 = 700;

/// Address of the rent precompile (`0x…0a`).
pub const RENT_PRECOMPILE_ADDRESS: Address = Address::from_low_u64(0x0a);

/// Number of code or storage words needed to hold `len` bytes.
///
/// # Examples
///
/// ```
/// use rent_core::constants::words_for_len;
/// assert_eq!(words_for_len(0), 0);
/// assert_eq!(words_for_len(1), 1);
/// assert_eq!(words_for_len(32), 1);
/// assert_eq!(words_for_len(33), 2);
/// ```
pub const fn words_for_len(len: usize) -> u64 {
    (len as u64).div_ceil(WORD_SIZE)
}

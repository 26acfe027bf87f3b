//! Entry of pre-existing accounts into the rent regime.
//!
//! Accounts created before the upgrade block carry `rent_last_paid == 0`.
//! On migration they are granted enough rent balance to survive the grace
//! period at their current size, keeping any larger balance they already
//! hold, and are marked as paid up to the upgrade block.

use rent_core::ledger::RentRecord;
use rent_core::traits::RentCalculator;

/// Grace grant for a record of this size: `cost_per_block * grace_blocks`.
pub fn grace_grant<C: RentCalculator + ?Sized>(calc: &C, record: &RentRecord) -> u64 {
    calc.rent_due(
        record.cost_per_block(calc),
        calc.params().migration_grace_blocks,
    )
}

/// Migrate `record` into the rent regime at `upgrade_block`.
///
/// Records that have already been settled are returned unchanged, so the
/// lazy (first touch) and eager (upgrade block) paths can both call this
/// without coordinating.
pub fn migrate<C: RentCalculator + ?Sized>(
    calc: &C,
    record: &RentRecord,
    upgrade_block: u64,
) -> RentRecord {
    if !record.is_unsettled() {
        return record.clone();
    }
    let granted = record.rent_balance().max(grace_grant(calc, record));
    RentRecord::derive(
        calc,
        granted,
        upgrade_block,
        record.storage_word_count(),
        record.code_word_count(),
    )
}

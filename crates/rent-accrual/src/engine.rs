//! Rent engine implementing the [`RentCalculator`] trait.
//!
//! Rent accrues linearly: an account owes `cost_per_block` for every block
//! since it was last settled. Settlement computes the whole debt in one step
//! with u128 intermediates, then clamps the deduction at the available
//! rent balance.

use rent_core::ledger::RentRecord;
use rent_core::params::RentParams;
use rent_core::traits::{RentCalculator, Settlement};
use tracing::warn;

/// Saturate a 128-bit intermediate to `u64::MAX`.
fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// The production rent calculator.
///
/// Implements [`RentCalculator`] with:
/// - `cost = account_cost + word_cost * code_words + word_cost * storage_words`
/// - `due = blocks * cost`, saturated
/// - deductions clamped at the rent balance
#[derive(Debug, Clone, Default)]
pub struct RentEngine {
    params: RentParams,
}

impl RentEngine {
    /// Create an engine charging by `params`.
    pub fn new(params: RentParams) -> Self {
        Self { params }
    }
}

impl RentCalculator for RentEngine {
    fn params(&self) -> &RentParams {
        &self.params
    }

    fn cost_per_block(&self, code_words: u64, storage_words: u64) -> u64 {
        let word_cost = self.params.word_cost as u128;
        let cost = self.params.account_cost as u128
            + word_cost * code_words as u128
            + word_cost * storage_words as u128;
        saturate(cost)
    }

    fn rent_due(&self, cost_per_block: u64, blocks: u64) -> u64 {
        saturate(cost_per_block as u128 * blocks as u128)
    }

    fn settle(&self, record: &RentRecord, current_block: u64) -> Settlement {
        let last_paid = record.rent_last_paid();
        debug_assert!(
            current_block >= last_paid,
            "settle at block {current_block} before last payment {last_paid}"
        );

        // Records outside the rent regime are migrated, never charged.
        if record.is_unsettled() || current_block <= last_paid {
            if current_block < last_paid {
                warn!(current_block, last_paid, "block regression during settlement, nothing charged");
            }
            return Settlement {
                record: record.clone(),
                charged: 0,
            };
        }

        let blocks = current_block - last_paid;
        let due = self.rent_due(record.cost_per_block(self), blocks);
        let charged = due.min(record.rent_balance());

        let settled = RentRecord::derive(
            self,
            record.rent_balance() - charged,
            current_block,
            record.storage_word_count(),
            record.code_word_count(),
        );

        Settlement {
            record: settled,
            charged,
        }
    }
}

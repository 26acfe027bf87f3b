//! # rent-accrual: Closed-form storage rent accrual.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Lazy accrual**: rent owed since the last settlement is computed in
//!   one step as `blocks * cost_per_block`, never by iterating blocks.
//! - **Saturation**: products are taken in 128 bits and saturated to
//!   `u64::MAX`; balances clamp at zero instead of failing.
//! - **Migration**: pre-existing accounts get a grace grant when they first
//!   enter the rent regime.

pub mod engine;
pub mod migration;

pub use engine::RentEngine;
pub use migration::migrate;

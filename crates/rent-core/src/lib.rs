//! # rent-core
//! Foundation types and traits for storage rent accounting.
//!
//! - [`types`]: addresses, storage words, eviction horizons
//! - [`ledger`]: per-account records with the derived eviction block
//! - [`scheduler`]: dual-indexed `(evict_block, address)` schedule
//! - [`traits`]: the [`RentCalculator`](traits::RentCalculator) contract

pub mod constants;
pub mod error;
pub mod ledger;
pub mod params;
pub mod scheduler;
pub mod traits;
pub mod types;

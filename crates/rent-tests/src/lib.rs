//! Integration test suite for storage rent.
//!
//! The tests drive the processor and the node end to end: activation,
//! direct payment, eviction on touch, re-entry, migration into the rent
//! regime, rollback and persistence across restarts.

pub mod helpers;

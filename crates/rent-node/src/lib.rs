//! # rent-node: Rent processing, world state and persistence.
//!
//! Composes the rent subsystems into a block-driven node:
//! - [`processor::RentProcessor`]: applies rent triggers, eviction and migration
//! - [`context::TxContext`]: per-transaction view with rent hooks and opcodes
//! - [`state::WorldState`]: journaled accounts and storage slots
//! - [`storage::RocksStore`]: persistent state backed by RocksDB
//! - [`node::RentNode`]: block lifecycle wiring state, processor and storage
//! - [`config::NodeConfig`]: node configuration

pub mod config;
pub mod context;
pub mod dispatch;
pub mod node;
pub mod precompile;
pub mod processor;
pub mod state;
pub mod storage;

pub use config::NodeConfig;
pub use context::TxContext;
pub use node::RentNode;
pub use processor::RentProcessor;
pub use state::WorldState;
pub use storage::RocksStore;

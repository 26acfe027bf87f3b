//! Shared test helpers for integration tests.

use std::path::Path;
use std::sync::Arc;

use rent_accrual::RentEngine;
use rent_core::error::Error;
use rent_core::params::RentParams;
use rent_core::types::{Address, EvictionBoundary, Word};
use rent_node_lib::node::BlockSummary;
use rent_node_lib::processor::{FinalizeReport, RentProcessor};
use rent_node_lib::{NodeConfig, RentNode, TxContext};

/// Upgrade block used by [`params`].
pub const UPGRADE: u64 = 10;

/// Stipend used by [`params`]: ten blocks of a bare account.
pub const STIPEND: u64 = 40_000;

/// A small rent schedule: 4_000 per account, 250 per word, 100 grace blocks.
pub fn params(boundary: EvictionBoundary) -> RentParams {
    RentParams {
        account_cost: 4_000,
        word_cost: 250,
        stipend: STIPEND,
        upgrade_block: UPGRADE,
        migration_grace_blocks: 100,
        eviction_boundary: boundary,
    }
}

/// Address with a recognizable low byte pattern.
pub fn addr(seed: u8) -> Address {
    Address::from_low_u64(seed as u64 + 1)
}

pub fn word(n: u64) -> Word {
    Word::from_low_u64(n)
}

pub fn processor(params: RentParams) -> RentProcessor {
    RentProcessor::new(Arc::new(RentEngine::new(params)))
}

/// Node config over `params`. Persists only when `data_dir` is given.
pub fn config(params: RentParams, data_dir: Option<&Path>) -> NodeConfig {
    let defaults = NodeConfig::default();
    NodeConfig {
        data_dir: data_dir.map_or(defaults.data_dir.clone(), Path::to_path_buf),
        persist: data_dir.is_some(),
        rent: params,
        ..defaults
    }
}

pub fn memory_node(params: RentParams) -> Arc<RentNode> {
    RentNode::in_memory(config(params, None)).unwrap()
}

/// Run one transaction in its own block.
pub fn run_block<T>(
    node: &RentNode,
    block: u64,
    f: impl FnOnce(&mut TxContext<'_>) -> Result<T, Error>,
) -> (T, FinalizeReport, BlockSummary) {
    node.begin_block(block).unwrap();
    let (value, report) = node.execute_transaction(f).unwrap();
    let summary = node.end_block().unwrap();
    (value, report, summary)
}

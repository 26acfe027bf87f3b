//! Persistence across node restarts.
//!
//! Each test opens a RocksDB-backed node in a temp directory, drives a few
//! blocks, drops the node and reopens it from the same directory.

use std::sync::Arc;

use rent_core::error::{Error, RentError};
use rent_core::types::{Address, EvictBlock, EvictionBoundary};
use rent_node_lib::RentNode;
use rent_tests::helpers::*;

fn open(dir: &tempfile::TempDir) -> Arc<RentNode> {
    RentNode::open(config(params(EvictionBoundary::Inclusive), Some(dir.path()))).unwrap()
}

fn schedule(node: &RentNode) -> Vec<(u64, Address)> {
    node.with_state(|s| s.scheduler().iter().collect())
}

/// Funder with long-lived rent and a user with two storage slots.
fn seed_history(node: &RentNode) {
    run_block(node, UPGRADE, |ctx| {
        ctx.mint(addr(0), 100_000_000)?;
        ctx.send_rent(addr(0), addr(0), 50_000_000)?;
        Ok(())
    });
    run_block(node, 11, |ctx| {
        ctx.transfer(addr(0), addr(1), 500)?;
        ctx.storage_write(addr(1), word(1), word(7));
        ctx.storage_write(addr(1), word(2), word(8));
        ctx.create_account(addr(2), vec![1, 2, 3]);
        Ok(())
    });
}

#[test]
fn reopen_restores_state_and_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let (digest, sched, user) = {
        let node = open(&dir);
        seed_history(&node);
        (node.digest(), schedule(&node), node.account(&addr(1)))
    };

    let node = open(&dir);
    assert_eq!(node.last_block(), Some(11));
    assert_eq!(node.digest(), digest);
    assert_eq!(schedule(&node), sched);
    assert_eq!(node.account(&addr(1)), user);
    assert_eq!(node.with_state(|s| s.storage(&addr(1), &word(2))), word(8));

    // 4_000 + 2 * 250 per block from block 11.
    assert_eq!(
        node.account(&addr(1)).unwrap().rent().rent_evict_block(),
        EvictBlock::At(19)
    );
    assert_eq!(node.due_by(19), vec![addr(1)]);
}

#[test]
fn reopen_rejects_old_blocks() {
    let dir = tempfile::tempdir().unwrap();
    {
        let node = open(&dir);
        seed_history(&node);
    }
    let node = open(&dir);
    assert!(matches!(
        node.begin_block(11),
        Err(Error::Rent(RentError::BlockRegression { current: 11, got: 11 }))
    ));
    node.begin_block(12).unwrap();
    node.end_block().unwrap();
}

#[test]
fn eviction_deletes_persisted_rows() {
    let dir = tempfile::tempdir().unwrap();
    {
        let node = open(&dir);
        seed_history(&node);
        let stats = node.store_stats().unwrap().unwrap();
        assert_eq!(stats.accounts, 3);
        assert_eq!(stats.slots, 2);

        let (_, report, summary) = run_block(&node, 19, |ctx| {
            ctx.touch(addr(1));
            Ok(())
        });
        assert_eq!(report.evicted, vec![addr(1)]);
        assert!(summary.persisted_accounts >= 1);

        let stats = node.store_stats().unwrap().unwrap();
        assert_eq!(stats.accounts, 2);
        assert_eq!(stats.slots, 0);
        assert_eq!(stats.last_block, Some(19));
        node.compact().unwrap();
    }

    let node = open(&dir);
    assert!(node.account(&addr(1)).is_none());
    assert!(node.with_state(|s| s.storage(&addr(1), &word(1)).is_zero()));
    assert!(node.account(&addr(2)).is_some());
}

#[test]
fn reverted_writes_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    {
        let node = open(&dir);
        seed_history(&node);
        node.begin_block(12).unwrap();
        let r = node.execute_transaction(|ctx| {
            ctx.storage_write(addr(1), word(3), word(9));
            ctx.transfer(addr(1), addr(5), 1_000)?;
            Ok(())
        });
        assert!(r.is_err());
        node.end_block().unwrap();
    }

    let node = open(&dir);
    assert_eq!(node.last_block(), Some(12));
    assert!(node.with_state(|s| s.storage(&addr(1), &word(3)).is_zero()));
    assert!(node.account(&addr(5)).is_none());
    assert_eq!(
        node.account(&addr(1)).unwrap().rent().storage_word_count(),
        2
    );
}

#[test]
fn in_memory_node_has_no_store() {
    let node = memory_node(params(EvictionBoundary::Inclusive));
    assert_eq!(node.store_stats().unwrap(), None);
    node.compact().unwrap();
}

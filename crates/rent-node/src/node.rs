//! Rent node composition and block lifecycle.
//!
//! The [`RentNode`] wires the rent engine, the in-memory [`WorldState`] and
//! optional RocksDB persistence together. Blocks are driven explicitly:
//!
//! 1. [`begin_block`](RentNode::begin_block) checks block monotonicity and
//!    runs eager migration at the upgrade block.
//! 2. [`execute_transaction`](RentNode::execute_transaction) runs one
//!    transaction under the state write lock. A failed transaction is rolled
//!    back in full; a successful one is finalized (eviction and empty-account
//!    removal for every touched account).
//! 3. [`end_block`](RentNode::end_block) persists the block's changes and
//!    reports the accounts whose horizon has passed, as a maintenance hint.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use rent_accrual::RentEngine;
use rent_core::error::{Error, RentError};
use rent_core::ledger::Account;
use rent_core::traits::RentCalculator;
use rent_core::types::Address;

use crate::config::NodeConfig;
use crate::context::TxContext;
use crate::processor::{FinalizeReport, RentProcessor};
use crate::state::WorldState;
use crate::storage::{RocksStore, StoreStats};

/// Block progress of the node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cursor {
    /// Last block that was ended.
    last_block: Option<u64>,
    /// Block currently open, if any.
    current: Option<u64>,
}

/// What happened during one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub block: u64,
    /// Accounts migrated eagerly when this block began.
    pub migrated: usize,
    /// Account rows written to disk.
    pub persisted_accounts: usize,
    /// Accounts whose horizon has passed but that remain in state until touched.
    pub due: Vec<Address>,
}

/// The rent node: engine, world state and storage.
pub struct RentNode {
    /// World state behind a read-write lock. Transactions hold the write
    /// lock for their whole duration.
    state: RwLock<WorldState>,
    /// Applies rent triggers.
    processor: RentProcessor,
    /// RocksDB storage (None for in-memory nodes).
    storage: Option<Arc<RwLock<RocksStore>>>,
    cursor: Mutex<Cursor>,
    /// Eager migration count for the open block.
    migrated: Mutex<usize>,
    config: NodeConfig,
}

impl RentNode {
    /// Open a node, loading any persisted state from `config.db_path()`.
    pub fn open(config: NodeConfig) -> Result<Arc<Self>, Error> {
        config.validate()?;
        let calc: Arc<dyn RentCalculator> = Arc::new(RentEngine::new(config.rent.clone()));

        let (state, storage, last_block) = if config.persist {
            let store = RocksStore::open(config.db_path())?;
            let state = store.load_state(calc.as_ref())?;
            let last_block = store.last_block()?;
            (state, Some(Arc::new(RwLock::new(store))), last_block)
        } else {
            (WorldState::new(), None, None)
        };

        info!(
            accounts = state.ledger().len(),
            last_block = ?last_block,
            persist = config.persist,
            "rent node opened"
        );

        Ok(Arc::new(Self {
            state: RwLock::new(state),
            processor: RentProcessor::new(calc),
            storage,
            cursor: Mutex::new(Cursor {
                last_block,
                current: None,
            }),
            migrated: Mutex::new(0),
            config,
        }))
    }

    /// Create a node without persistence (for testing).
    pub fn in_memory(config: NodeConfig) -> Result<Arc<Self>, Error> {
        Self::open(NodeConfig {
            persist: false,
            ..config
        })
    }

    /// Open block `block`.
    ///
    /// Block numbers must strictly increase. At the first block at or past
    /// the upgrade block, eager migration (if enabled) brings every
    /// pre-existing account into the rent regime before any transaction runs.
    pub fn begin_block(&self, block: u64) -> Result<(), Error> {
        let mut cursor = self.cursor.lock();
        if let Some(open) = cursor.current {
            return Err(RentError::BlockInProgress(open).into());
        }
        if let Some(last) = cursor.last_block {
            if block <= last {
                return Err(RentError::BlockRegression {
                    current: last,
                    got: block,
                }
                .into());
            }
        }

        let upgrade_block = self.config.rent.upgrade_block;
        let crosses_upgrade =
            block >= upgrade_block && cursor.last_block.is_none_or(|last| last < upgrade_block);

        let mut migrated = 0;
        if self.config.eager_migration && crosses_upgrade {
            let mut state = self.state.write();
            let checkpoint = state.checkpoint();
            migrated = self.processor.migrate_all(&mut state);
            state.commit(checkpoint);
            info!(block, upgrade_block, migrated, "eager rent migration");
        }
        *self.migrated.lock() = migrated;

        cursor.current = Some(block);
        debug!(block, "began block");
        Ok(())
    }

    /// Run one transaction in the open block.
    ///
    /// `f` receives a [`TxContext`]. If it returns an error every write it
    /// made is reverted and nothing is finalized; otherwise touched accounts
    /// are finalized and the report is returned alongside `f`'s result.
    pub fn execute_transaction<T, F>(&self, f: F) -> Result<(T, FinalizeReport), Error>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T, Error>,
    {
        let block = self.current_block()?;
        let mut state = self.state.write();
        let checkpoint = state.checkpoint();

        let outcome = {
            let mut ctx = TxContext::new(&self.processor, &mut state, block);
            f(&mut ctx).map(|value| (value, ctx.finalize()))
        };

        match outcome {
            Ok((value, report)) => {
                state.commit(checkpoint);
                if !report.evicted.is_empty() {
                    info!(block, evicted = report.evicted.len(), "evicted accounts");
                }
                Ok((value, report))
            }
            Err(e) => {
                state.revert_to(checkpoint);
                debug!(block, "transaction reverted: {e}");
                Err(e)
            }
        }
    }

    /// Close the open block: persist its changes and compute sweep hints.
    pub fn end_block(&self) -> Result<BlockSummary, Error> {
        let mut cursor = self.cursor.lock();
        let block = cursor.current.ok_or(RentError::NoActiveBlock)?;

        let (persisted_accounts, due) = {
            let mut state = self.state.write();
            let dirty = state.take_dirty();
            let persisted = match &self.storage {
                Some(store) => match store.read().persist(&state, &dirty, block) {
                    Ok(n) => n,
                    Err(e) => {
                        state.restore_dirty(dirty);
                        warn!(block, "persist failed, block left open: {e}");
                        return Err(e);
                    }
                },
                None => 0,
            };
            (persisted, self.processor.due_by(&state, block))
        };

        cursor.last_block = Some(block);
        cursor.current = None;

        let summary = BlockSummary {
            block,
            migrated: std::mem::take(&mut *self.migrated.lock()),
            persisted_accounts,
            due,
        };
        info!(
            block,
            persisted = summary.persisted_accounts,
            due = summary.due.len(),
            digest = %hex::encode(self.digest()),
            "ended block"
        );
        Ok(summary)
    }

    /// Block currently open.
    pub fn current_block(&self) -> Result<u64, Error> {
        self.cursor
            .lock()
            .current
            .ok_or_else(|| RentError::NoActiveBlock.into())
    }

    /// Last block that was ended.
    pub fn last_block(&self) -> Option<u64> {
        self.cursor.lock().last_block
    }

    /// Stored rent balance of `address`. Never settles.
    pub fn rent_balance_of(&self, address: &Address) -> u64 {
        self.processor.rent_balance_of(&self.state.read(), address)
    }

    pub fn account(&self, address: &Address) -> Option<Account> {
        self.state.read().account(address).cloned()
    }

    /// Accounts whose horizon has passed at `block`. Removes nothing.
    pub fn due_by(&self, block: u64) -> Vec<Address> {
        self.processor.due_by(&self.state.read(), block)
    }

    /// Commitment over accounts and storage.
    pub fn digest(&self) -> [u8; 32] {
        self.state.read().digest()
    }

    /// Run `f` with read access to the world state.
    pub fn with_state<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&self.state.read())
    }

    /// On-disk statistics, or `None` for in-memory nodes.
    pub fn store_stats(&self) -> Result<Option<StoreStats>, Error> {
        self.storage
            .as_ref()
            .map(|store| store.read().stats())
            .transpose()
    }

    /// Compact the underlying store, reclaiming space from evicted accounts.
    pub fn compact(&self) -> Result<(), Error> {
        match &self.storage {
            Some(store) => store.read().compact(),
            None => Ok(()),
        }
    }

    pub fn processor(&self) -> &RentProcessor {
        &self.processor
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

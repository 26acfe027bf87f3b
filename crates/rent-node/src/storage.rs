//! RocksDB-backed persistent rent state.
//!
//! Column families:
//! - `accounts`: address → bincode [`StoredAccount`]
//! - `storage`: `address || key` → 32-byte value (non-zero slots only)
//! - `metadata`: last persisted block
//!
//! Only primary fields are written. The code word count and the eviction
//! block are re-derived on load, and the eviction schedule is rebuilt from
//! the ledger. Each block's changes go out in one atomic [`WriteBatch`].

use std::collections::BTreeMap;
use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use rent_core::error::Error;
use rent_core::ledger::{Account, AccountLedger};
use rent_core::traits::RentCalculator;
use rent_core::types::{Address, Word};

use crate::state::{DirtySet, WorldState};

// --- Column family names ---

const CF_ACCOUNTS: &str = "accounts";
const CF_STORAGE: &str = "storage";
const CF_METADATA: &str = "metadata";

const ALL_CFS: &[&str] = &[CF_ACCOUNTS, CF_STORAGE, CF_METADATA];

// --- Metadata keys ---

const META_LAST_BLOCK: &[u8] = b"last_block";

const SLOT_KEY_LEN: usize = Address::LEN + Word::LEN;

/// On-disk account encoding.
#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq, Eq)]
struct StoredAccount {
    balance: u64,
    nonce: u64,
    code: Vec<u8>,
    rent_balance: u64,
    rent_last_paid: u64,
    storage_word_count: u64,
}

impl StoredAccount {
    fn from_account(account: &Account) -> Self {
        Self {
            balance: account.balance,
            nonce: account.nonce,
            code: account.code().to_vec(),
            rent_balance: account.rent().rent_balance(),
            rent_last_paid: account.rent().rent_last_paid(),
            storage_word_count: account.rent().storage_word_count(),
        }
    }

    fn into_account(self, calc: &dyn RentCalculator) -> Account {
        Account::restore(
            calc,
            self.balance,
            self.nonce,
            self.code,
            self.rent_balance,
            self.rent_last_paid,
            self.storage_word_count,
        )
    }
}

/// Row counts of a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub accounts: u64,
    pub slots: u64,
    pub last_block: Option<u64>,
}

/// RocksDB-backed rent state storage.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a database at `path`, creating missing column families.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self { db })
    }

    /// Write the dirty accounts and slots of `state` as of `block`.
    ///
    /// Keys absent from `state` are deleted. Returns the number of account
    /// rows touched.
    pub fn persist(&self, state: &WorldState, dirty: &DirtySet, block: u64) -> Result<usize, Error> {
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let cf_storage = self.cf_handle(CF_STORAGE)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;
        let mut batch = WriteBatch::default();

        for address in &dirty.accounts {
            match state.account(address) {
                Some(account) => {
                    let bytes = Self::encode_account(account)?;
                    batch.put_cf(cf_accounts, address.as_bytes(), bytes);
                }
                None => batch.delete_cf(cf_accounts, address.as_bytes()),
            }
        }

        for (address, key) in &dirty.slots {
            let slot_key = Self::slot_key(address, key);
            let value = state.storage(address, key);
            if value.is_zero() {
                batch.delete_cf(cf_storage, slot_key);
            } else {
                batch.put_cf(cf_storage, slot_key, value.as_bytes());
            }
        }

        batch.put_cf(cf_meta, META_LAST_BLOCK, block.to_le_bytes());
        self.db
            .write(batch)
            .map_err(|e| Error::Storage(e.to_string()))?;

        debug!(
            block,
            accounts = dirty.accounts.len(),
            slots = dirty.slots.len(),
            "persisted block"
        );
        Ok(dirty.accounts.len())
    }

    /// Load every account and slot into a fresh [`WorldState`].
    pub fn load_state(&self, calc: &dyn RentCalculator) -> Result<WorldState, Error> {
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let mut ledger = AccountLedger::new();
        for item in self.db.iterator_cf(cf_accounts, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| Error::Storage(e.to_string()))?;
            let address = Address::from_slice(&key)?;
            ledger.insert(address, Self::decode_account(&value)?.into_account(calc));
        }

        let cf_storage = self.cf_handle(CF_STORAGE)?;
        let mut storage = BTreeMap::new();
        for item in self.db.iterator_cf(cf_storage, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| Error::Storage(e.to_string()))?;
            let (address, slot) = Self::decode_slot_key(&key)?;
            storage.insert((address, slot), Self::decode_word(&value)?);
        }

        info!(
            accounts = ledger.len(),
            slots = storage.len(),
            "loaded rent state"
        );
        Ok(WorldState::from_parts(ledger, storage))
    }

    /// Read a single account.
    pub fn get_account(&self, calc: &dyn RentCalculator, address: &Address) -> Result<Option<Account>, Error> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self
            .db
            .get_cf(cf, address.as_bytes())
            .map_err(|e| Error::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode_account(&bytes)?.into_account(calc))),
            None => Ok(None),
        }
    }

    /// Last block persisted, if any.
    pub fn last_block(&self) -> Result<Option<u64>, Error> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self
            .db
            .get_cf(cf, META_LAST_BLOCK)
            .map_err(|e| Error::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("invalid metadata value length".into()))?;
                Ok(Some(u64::from_le_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// Count rows in each column family.
    pub fn stats(&self) -> Result<StoreStats, Error> {
        Ok(StoreStats {
            accounts: self.count(CF_ACCOUNTS)?,
            slots: self.count(CF_STORAGE)?,
            last_block: self.last_block()?,
        })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush().map_err(|e| Error::Storage(e.to_string()))
    }

    /// Trigger manual compaction across all column families.
    ///
    /// Reclaims space held by evicted accounts and cleared slots.
    pub fn compact(&self) -> Result<(), Error> {
        for cf_name in ALL_CFS {
            let cf = self.cf_handle(cf_name)?;
            self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    // --- Internal helpers ---

    fn count(&self, cf_name: &str) -> Result<u64, Error> {
        let cf = self.cf_handle(cf_name)?;
        let mut n = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|e| Error::Storage(e.to_string()))?;
            n += 1;
        }
        Ok(n)
    }

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, Error> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("missing column family: {name}")))
    }

    fn encode_account(account: &Account) -> Result<Vec<u8>, Error> {
        bincode::encode_to_vec(StoredAccount::from_account(account), bincode::config::standard())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    fn decode_account(bytes: &[u8]) -> Result<StoredAccount, Error> {
        let (stored, _): (StoredAccount, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(stored)
    }

    /// `address || key`, so one account's slots are contiguous.
    fn slot_key(address: &Address, key: &Word) -> [u8; SLOT_KEY_LEN] {
        let mut out = [0u8; SLOT_KEY_LEN];
        out[..Address::LEN].copy_from_slice(address.as_bytes());
        out[Address::LEN..].copy_from_slice(key.as_bytes());
        out
    }

    fn decode_slot_key(bytes: &[u8]) -> Result<(Address, Word), Error> {
        if bytes.len() != SLOT_KEY_LEN {
            return Err(Error::Storage(format!(
                "invalid slot key length: {}",
                bytes.len()
            )));
        }
        let (address, key) = bytes.split_at(Address::LEN);
        Ok((Address::from_slice(address)?, Self::decode_word(key)?))
    }

    fn decode_word(bytes: &[u8]) -> Result<Word, Error> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Storage(format!("invalid word length: {}", bytes.len())))?;
        Ok(Word(arr))
    }
}

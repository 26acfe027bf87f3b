//! Account ledger: per-account records and their rent fields.
//!
//! [`RentRecord`] keeps `rent_evict_block` derived from the other four rent
//! fields at all times. Its fields are private and every constructor or
//! mutator goes through a [`RentCalculator`], so no code path can change a
//! balance, a word count or the last-paid block without also recomputing
//! the eviction block.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::words_for_len;
use crate::traits::RentCalculator;
use crate::types::{Address, EvictBlock};

/// Rent-relevant fields of an account.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RentRecord {
    rent_balance: u64,
    rent_last_paid: u64,
    storage_word_count: u64,
    code_word_count: u64,
    rent_evict_block: EvictBlock,
}

impl RentRecord {
    /// Build a record from its primary fields, deriving the eviction block.
    pub fn derive<C: RentCalculator + ?Sized>(
        calc: &C,
        rent_balance: u64,
        rent_last_paid: u64,
        storage_word_count: u64,
        code_word_count: u64,
    ) -> Self {
        let cost = calc.cost_per_block(code_word_count, storage_word_count);
        Self {
            rent_balance,
            rent_last_paid,
            storage_word_count,
            code_word_count,
            rent_evict_block: calc.eviction_block(rent_last_paid, rent_balance, cost),
        }
    }

    /// A record that has never been settled (`rent_last_paid == 0`).
    pub fn unsettled<C: RentCalculator + ?Sized>(
        calc: &C,
        storage_word_count: u64,
        code_word_count: u64,
    ) -> Self {
        Self::derive(calc, 0, 0, storage_word_count, code_word_count)
    }

    pub fn rent_balance(&self) -> u64 {
        self.rent_balance
    }

    pub fn rent_last_paid(&self) -> u64 {
        self.rent_last_paid
    }

    pub fn storage_word_count(&self) -> u64 {
        self.storage_word_count
    }

    pub fn code_word_count(&self) -> u64 {
        self.code_word_count
    }

    pub fn rent_evict_block(&self) -> EvictBlock {
        self.rent_evict_block
    }

    /// Whether the record still carries the "never settled" sentinel.
    pub fn is_unsettled(&self) -> bool {
        self.rent_last_paid == 0
    }

    /// Current per-block cost of this record.
    pub fn cost_per_block<C: RentCalculator + ?Sized>(&self, calc: &C) -> u64 {
        calc.cost_per_block(self.code_word_count, self.storage_word_count)
    }

    pub fn with_rent_balance<C: RentCalculator + ?Sized>(&self, calc: &C, rent_balance: u64) -> Self {
        Self::derive(
            calc,
            rent_balance,
            self.rent_last_paid,
            self.storage_word_count,
            self.code_word_count,
        )
    }

    pub fn with_last_paid<C: RentCalculator + ?Sized>(&self, calc: &C, rent_last_paid: u64) -> Self {
        Self::derive(
            calc,
            self.rent_balance,
            rent_last_paid,
            self.storage_word_count,
            self.code_word_count,
        )
    }

    pub fn with_storage_words<C: RentCalculator + ?Sized>(&self, calc: &C, storage_word_count: u64) -> Self {
        Self::derive(
            calc,
            self.rent_balance,
            self.rent_last_paid,
            storage_word_count,
            self.code_word_count,
        )
    }

    pub fn with_code_words<C: RentCalculator + ?Sized>(&self, calc: &C, code_word_count: u64) -> Self {
        Self::derive(
            calc,
            self.rent_balance,
            self.rent_last_paid,
            self.storage_word_count,
            code_word_count,
        )
    }
}

/// A full account: spendable balance, nonce, code and rent fields.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Spendable balance in base units.
    pub balance: u64,
    /// Transaction/creation counter.
    pub nonce: u64,
    code: Vec<u8>,
    rent: RentRecord,
}

impl Account {
    /// A code-less account with the given rent record.
    pub fn with_rent(rent: RentRecord) -> Self {
        Self {
            balance: 0,
            nonce: 0,
            code: Vec::new(),
            rent,
        }
    }

    /// Rebuild an account from persisted primary fields.
    ///
    /// The code word count and eviction block are derived, never trusted
    /// from disk.
    pub fn restore<C: RentCalculator + ?Sized>(
        calc: &C,
        balance: u64,
        nonce: u64,
        code: Vec<u8>,
        rent_balance: u64,
        rent_last_paid: u64,
        storage_word_count: u64,
    ) -> Self {
        let rent = RentRecord::derive(
            calc,
            rent_balance,
            rent_last_paid,
            storage_word_count,
            words_for_len(code.len()),
        );
        Self {
            balance,
            nonce,
            code,
            rent,
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn rent(&self) -> &RentRecord {
        &self.rent
    }

    /// Replace the code, updating the code word count and eviction block.
    pub fn set_code<C: RentCalculator + ?Sized>(&mut self, calc: &C, code: Vec<u8>) {
        self.rent = self.rent.with_code_words(calc, words_for_len(code.len()));
        self.code = code;
    }

    /// Replace the rent record.
    ///
    /// The record's code word count must match the account's code.
    pub fn set_rent(&mut self, rent: RentRecord) {
        debug_assert_eq!(rent.code_word_count(), words_for_len(self.code.len()));
        self.rent = rent;
    }

    /// No balance, no code, no storage and a zero nonce.
    pub fn is_empty(&self) -> bool {
        self.balance == 0
            && self.nonce == 0
            && self.code.is_empty()
            && self.rent.storage_word_count() == 0
    }
}

/// Per-address account records.
///
/// Ordered by address so iteration, and therefore the digest, is identical
/// across implementations.
#[derive(Clone, Debug, Default)]
pub struct AccountLedger {
    accounts: BTreeMap<Address, Account>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Insert or replace an account, returning the previous record.
    pub fn insert(&mut self, address: Address, account: Account) -> Option<Account> {
        self.accounts.insert(address, account)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        self.accounts.remove(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Addresses still carrying the "never settled" sentinel.
    pub fn unsettled_addresses(&self) -> Vec<Address> {
        self.accounts
            .iter()
            .filter(|(_, a)| a.rent().is_unsettled())
            .map(|(addr, _)| *addr)
            .collect()
    }

    /// BLAKE3 commitment over every account's primary fields in address order.
    ///
    /// Layout per account: `address || balance || nonce || code_len || code ||
    /// rent_balance || rent_last_paid || storage_word_count`, integers
    /// little-endian. Derived fields are excluded.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for (address, account) in &self.accounts {
            hash_account(&mut hasher, address, account);
        }
        hasher.finalize().into()
    }
}

/// Feed one account into a digest in the canonical layout.
pub fn hash_account(hasher: &mut blake3::Hasher, address: &Address, account: &Account) {
    hasher.update(address.as_bytes());
    hasher.update(&account.balance.to_le_bytes());
    hasher.update(&account.nonce.to_le_bytes());
    hasher.update(&(account.code.len() as u64).to_le_bytes());
    hasher.update(&account.code);
    hasher.update(&account.rent.rent_balance().to_le_bytes());
    hasher.update(&account.rent.rent_last_paid().to_le_bytes());
    hasher.update(&account.rent.storage_word_count().to_le_bytes());
}

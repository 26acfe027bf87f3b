//! Core protocol types: addresses, storage words, eviction horizons.
//!
//! All block numbers and monetary values are u64 per protocol convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;

/// A 20-byte account address.
///
/// Ordering is plain byte-wise ascending order; the eviction schedule
/// breaks ties between equal eviction blocks with it.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// The largest address. Upper bound for range scans.
    pub const MAX: Self = Self([0xFF; 20]);

    /// Length of an address in bytes.
    pub const LEN: usize = 20;

    /// Address whose last eight bytes hold `value` big-endian.
    ///
    /// # Examples
    ///
    /// ```
    /// use rent_core::types::Address;
    /// let a = Address::from_low_u64(0x0a);
    /// assert_eq!(a.to_string(), "0x000000000000000000000000000000000000000a");
    /// ```
    pub const fn from_low_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut out = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            out[12 + i] = be[i];
            i += 1;
        }
        Self(out)
    }

    /// Create an address from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse an address from a 20-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 32-byte storage key or value.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Word(pub [u8; 32]);

impl Word {
    /// The zero word. A slot holding it is considered unoccupied.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Length of a word in bytes.
    pub const LEN: usize = 32;

    /// Word whose last eight bytes hold `value` big-endian.
    pub fn from_low_u64(value: u64) -> Self {
        let mut out = [0u8; 32];
        out[24..].copy_from_slice(&value.to_be_bytes());
        Self(out)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero word.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Word {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// First block at which an account becomes evictable.
///
/// `Never` sorts after every finite block. It is used when the account's
/// cost per block is zero, and for records that have not entered the rent
/// regime yet.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum EvictBlock {
    /// Evictable from this block on (subject to [`EvictionBoundary`]).
    At(u64),
    /// Never evictable at the current cost.
    Never,
}

impl EvictBlock {
    /// The finite block, if any.
    pub fn block(self) -> Option<u64> {
        match self {
            Self::At(b) => Some(b),
            Self::Never => None,
        }
    }

    pub fn is_never(self) -> bool {
        matches!(self, Self::Never)
    }
}

impl fmt::Display for EvictBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(b) => write!(f, "{b}"),
            Self::Never => f.write_str("never"),
        }
    }
}

/// Comparison used to decide whether an account is evictable.
///
/// # Examples
///
/// ```
/// use rent_core::types::{EvictBlock, EvictionBoundary};
/// let at = EvictBlock::At(350);
/// assert!(EvictionBoundary::Inclusive.is_evictable(350, at));
/// assert!(!EvictionBoundary::Strict.is_evictable(350, at));
/// assert!(EvictionBoundary::Strict.is_evictable(351, at));
/// ```
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionBoundary {
    /// Evictable when `current_block >= evict_block`.
    #[default]
    Inclusive,
    /// Evictable when `current_block > evict_block`.
    Strict,
}

impl EvictionBoundary {
    /// Authoritative eviction test for a touched account.
    pub fn is_evictable(self, current_block: u64, evict: EvictBlock) -> bool {
        match evict {
            EvictBlock::Never => false,
            EvictBlock::At(b) => match self {
                Self::Inclusive => current_block >= b,
                Self::Strict => current_block > b,
            },
        }
    }

    /// Largest eviction block that is due at `current_block`.
    ///
    /// Feeding this to the scheduler's `due_by` yields exactly the accounts
    /// for which [`is_evictable`](Self::is_evictable) holds.
    pub fn sweep_horizon(self, current_block: u64) -> Option<u64> {
        match self {
            Self::Inclusive => Some(current_block),
            Self::Strict => current_block.checked_sub(1),
        }
    }
}

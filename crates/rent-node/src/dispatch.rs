//! Rent opcodes exposed to the instruction dispatcher.
//!
//! | Opcode | Effect | Gas |
//! |---|---|---|
//! | `RENTBALANCE` | stored rent balance of an address | balance-query tier |
//! | `SENDRENT` | direct rent payment from the caller | base-op tier |
//!
//! The implicit settlements on storage write, value call and creation add
//! no gas of their own.

use std::fmt;

use rent_core::constants::{GAS_BALANCE_TIER, GAS_BASE_TIER};
use rent_core::types::Address;

/// A decoded rent opcode with its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RentOp {
    /// `RENTBALANCE address`
    RentBalance { address: Address },
    /// `SENDRENT recipient amount`
    SendRent { recipient: Address, amount: u64 },
}

impl RentOp {
    /// Fixed gas charged for the opcode.
    pub fn gas_cost(&self) -> u64 {
        match self {
            Self::RentBalance { .. } => GAS_BALANCE_TIER,
            Self::SendRent { .. } => GAS_BASE_TIER,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::RentBalance { .. } => "RENTBALANCE",
            Self::SendRent { .. } => "SENDRENT",
        }
    }
}

impl fmt::Display for RentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RentBalance { address } => write!(f, "RENTBALANCE {address}"),
            Self::SendRent { recipient, amount } => write!(f, "SENDRENT {recipient} {amount}"),
        }
    }
}

/// Result pushed back to the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpOutput {
    Balance(u64),
    Sent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_tiers() {
        let a = Address::from_low_u64(1);
        assert_eq!(RentOp::RentBalance { address: a }.gas_cost(), 400);
        assert_eq!(
            RentOp::SendRent {
                recipient: a,
                amount: 1
            }
            .gas_cost(),
            2
        );
    }

    #[test]
    fn display_uses_mnemonic() {
        let op = RentOp::SendRent {
            recipient: Address::from_low_u64(1),
            amount: 7,
        };
        assert!(op.to_string().starts_with(op.mnemonic()));
        assert!(op.to_string().ends_with(" 7"));
    }
}

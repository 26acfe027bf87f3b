//! Rent precompile: a flat-fee entry point that forwards to `SENDRENT`.
//!
//! Lets code-less accounts pay rent for another account without arbitrary
//! call capability. Input layout:
//!
//! ```text
//! recipient (20 bytes) || amount (32 bytes, big-endian)
//! ```
//!
//! The amount must fit in 64 bits.

use rent_core::constants::RENT_PRECOMPILE_FEE;
use rent_core::error::PrecompileError;
use rent_core::types::Address;

use crate::context::TxContext;

/// Exact input length in bytes.
pub const INPUT_LEN: usize = Address::LEN + 32;

/// Decoded precompile arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RentCall {
    pub recipient: Address,
    pub amount: u64,
}

impl RentCall {
    /// Encode as precompile input.
    pub fn encode(&self) -> [u8; INPUT_LEN] {
        let mut out = [0u8; INPUT_LEN];
        out[..Address::LEN].copy_from_slice(self.recipient.as_bytes());
        out[INPUT_LEN - 8..].copy_from_slice(&self.amount.to_be_bytes());
        out
    }
}

/// Decode precompile input.
pub fn parse_input(input: &[u8]) -> Result<RentCall, PrecompileError> {
    if input.len() != INPUT_LEN {
        return Err(PrecompileError::MalformedInput {
            expected: INPUT_LEN,
            got: input.len(),
        });
    }
    let (recipient, amount) = input.split_at(Address::LEN);
    let (high, low) = amount.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return Err(PrecompileError::AmountOverflow);
    }
    let mut low_bytes = [0u8; 8];
    low_bytes.copy_from_slice(low);

    Ok(RentCall {
        recipient: Address::from_slice(recipient).map_err(|_| PrecompileError::MalformedInput {
            expected: INPUT_LEN,
            got: input.len(),
        })?,
        amount: u64::from_be_bytes(low_bytes),
    })
}

/// Run the precompile for `caller`. Returns the gas used.
pub fn run(
    ctx: &mut TxContext<'_>,
    caller: Address,
    input: &[u8],
    gas_limit: u64,
) -> Result<u64, PrecompileError> {
    if gas_limit < RENT_PRECOMPILE_FEE {
        return Err(PrecompileError::OutOfGas {
            limit: gas_limit,
            required: RENT_PRECOMPILE_FEE,
        });
    }
    let call = parse_input(input)?;
    ctx.send_rent(caller, call.recipient, call.amount)?;
    Ok(RENT_PRECOMPILE_FEE)
}

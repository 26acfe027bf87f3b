//! Error types for rent accounting.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RentError {
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u64, need: u64 },
    #[error("unknown or empty rent recipient: {0}")] UnknownRecipient(String),
    #[error("value overflow")] ValueOverflow,
    #[error("block regression: current {current}, got {got}")] BlockRegression { current: u64, got: u64 },
    #[error("no block in progress")] NoActiveBlock,
    #[error("block {0} already in progress")] BlockInProgress(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    #[error("malformed input: expected {expected} bytes, got {got}")] MalformedInput { expected: usize, got: usize },
    #[error("amount does not fit in 64 bits")] AmountOverflow,
    #[error("out of gas: limit {limit}, required {required}")] OutOfGas { limit: u64, required: u64 },
    #[error(transparent)] Rent(#[from] RentError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("upgrade block must be non-zero")] ZeroUpgradeBlock,
    #[error("migration grace period must be non-zero")] ZeroGracePeriod,
    #[error("stipend {stipend} is below one block of account rent {account_cost}")] StipendTooSmall { stipend: u64, account_cost: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)] Rent(#[from] RentError),
    #[error(transparent)] Precompile(#[from] PrecompileError),
    #[error(transparent)] Params(#[from] ParamsError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error("storage: {0}")] Storage(String),
    #[error("config: {0}")] Config(String),
}

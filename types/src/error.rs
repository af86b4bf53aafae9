//! Error type for value construction and arithmetic in the shared types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid oracle address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex value: {0}")]
    InvalidHex(String),

    #[error("reputation {0} exceeds 10000 basis points")]
    ReputationOutOfRange(u32),

    #[error("stake arithmetic overflow")]
    StakeOverflow,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

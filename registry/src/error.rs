use guardian_types::{OracleAddress, TypesError};
use thiserror::Error;

/// Failure reported by an [`OracleGateway`](crate::OracleGateway) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("oracle {0} not known to the gateway")]
    UnknownOracle(OracleAddress),

    #[error("gateway index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("gateway rejected request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Retryable: the previous snapshot is still in place.
    #[error("gateway unavailable, keeping last snapshot: {0}")]
    GatewayUnavailable(#[from] GatewayError),

    #[error("oracle {0} not found")]
    OracleNotFound(OracleAddress),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl RegistryError {
    /// Whether the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::GatewayUnavailable(_))
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VrfError {
    #[error("draw modulus must be positive")]
    ZeroModulus,
}

use guardian_committee::CommitteeError;
use guardian_types::{OracleAddress, RoundId, TypesError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("round {0} not found")]
    RoundNotFound(RoundId),

    #[error("round {0} already finalized")]
    RoundAlreadyFinalized(RoundId),

    #[error("invalid submission from {oracle}: {reason}")]
    InvalidSubmission { oracle: OracleAddress, reason: String },

    #[error("oracle {0} already submitted in this round")]
    DuplicateSubmission(OracleAddress),

    #[error("round has no voting weight")]
    NoVotingWeight,

    #[error("too many open rounds (max {0})")]
    TooManyOpenRounds(usize),

    #[error("round manager is shutting down")]
    ShuttingDown,

    #[error("stake arithmetic overflow")]
    StakeOverflow,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Committee(#[from] CommitteeError),
}

impl ConsensusError {
    pub(crate) fn invalid(oracle: OracleAddress, reason: impl Into<String>) -> Self {
        ConsensusError::InvalidSubmission {
            oracle,
            reason: reason.into(),
        }
    }

    /// Whether this is the committee selector refusing a too-small pool.
    pub fn is_insufficient_pool(&self) -> bool {
        matches!(self, ConsensusError::Committee(CommitteeError::InsufficientPool { .. }))
    }
}

impl From<TypesError> for ConsensusError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::StakeOverflow => ConsensusError::StakeOverflow,
            other => ConsensusError::InvalidParams(other.to_string()),
        }
    }
}

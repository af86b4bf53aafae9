use guardian_types::{OracleAddress, RoundId, Stake, TypesError};
use guardian_vrf::VrfError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitteeError {
    #[error("insufficient eligible oracles: {eligible} available, {required} required")]
    InsufficientPool { eligible: usize, required: usize },

    #[error("round {0} already has a committee")]
    RoundAlreadySelected(RoundId),

    #[error("stake arithmetic overflow")]
    StakeOverflow,

    #[error("invalid committee parameters: {0}")]
    InvalidParams(String),

    #[error("draw error: {0}")]
    Vrf(#[from] VrfError),
}

impl From<TypesError> for CommitteeError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::StakeOverflow => CommitteeError::StakeOverflow,
            other => CommitteeError::InvalidParams(other.to_string()),
        }
    }
}

/// Why a selection failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionFault {
    #[error("seed does not match round id and external seed")]
    SeedMismatch,

    #[error("selection proof does not match the selected set")]
    ProofMismatch,

    #[error("committee size {size} outside [{min}, {max}]")]
    SizeOutOfBounds { size: usize, min: usize, max: usize },

    #[error("oracle {0} appears more than once")]
    DuplicateOracle(OracleAddress),

    #[error("oracle {0} is not in the eligible pool")]
    UnknownOracle(OracleAddress),

    /// `expected` is `None` when the members' stakes overflow.
    #[error("recorded total stake {recorded} does not match the members' stake {expected:?}")]
    StakeMismatch {
        recorded: Stake,
        expected: Option<Stake>,
    },

    #[error("recomputed committee differs")]
    CommitteeMismatch,
}

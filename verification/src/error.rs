use guardian_committee::{CommitteeError, SelectionFault};
use guardian_consensus::ConsensusError;
use guardian_types::{DataHash, OracleAddress, Weight};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("selection invalid: {0}")]
    Selection(#[from] SelectionFault),

    #[error("selection could not be recomputed: {0}")]
    Recompute(#[from] CommitteeError),

    #[error("threshold {found} bps differs from configured {expected} bps")]
    ThresholdMismatch { expected: u32, found: u32 },

    #[error("oracle {0} submitted more than once")]
    DuplicateSubmission(OracleAddress),

    #[error("signature of {0} does not verify")]
    BadSignature(OracleAddress),

    #[error("recorded weight of {oracle} is {recorded}, snapshot says {expected}")]
    WeightMismatch {
        oracle: OracleAddress,
        recorded: Weight,
        expected: Weight,
    },

    #[error("oracle {0} is not in the snapshot")]
    UnknownOracle(OracleAddress),

    #[error("recorded leading weight {recorded} differs from recomputed {recomputed}")]
    TallyMismatch { recorded: Weight, recomputed: Weight },

    #[error("recorded consensus hash {recorded:?} differs from recomputed {recomputed:?}")]
    OutcomeMismatch {
        recorded: Option<DataHash>,
        recomputed: Option<DataHash>,
    },

    #[error("recorded consensus weight {recorded:?} differs from recomputed {recomputed:?}")]
    ConsensusWeightMismatch {
        recorded: Option<Weight>,
        recomputed: Option<Weight>,
    },

    #[error("tally error: {0}")]
    Tally(#[from] ConsensusError),
}

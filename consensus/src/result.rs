//! Finalized round records.

use crate::OracleSubmission;
use guardian_types::{DataHash, RoundId, Timestamp, Weight};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a round ended without a consensus hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The submission window closed before any hash reached the threshold.
    WindowExpired,
    /// Too few eligible oracles to form a committee.
    InsufficientEligibleOracles,
    /// Force-finalized while the node was stopping.
    ShutDown,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::WindowExpired => "window expired without consensus",
            FailureReason::InsufficientEligibleOracles => "insufficient eligible oracles",
            FailureReason::ShutDown => "finalized on shutdown",
        })
    }
}

/// Immutable outcome of a round.
///
/// `consensus_hash` and `consensus_weight` are both set or both `None`.
/// `leading_weight` is the weight behind the most-supported hash whatever the
/// outcome, so a failed round still shows how close it came.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub round_id: RoundId,
    pub consensus_hash: Option<DataHash>,
    pub consensus_weight: Option<Weight>,
    pub leading_weight: Weight,
    pub total_weight: Weight,
    pub threshold_bps: u32,
    pub submissions: Vec<OracleSubmission>,
    pub failure: Option<FailureReason>,
    pub timestamp: Timestamp,
}

impl ConsensusResult {
    pub fn reached(&self) -> bool {
        self.consensus_hash.is_some()
    }
}

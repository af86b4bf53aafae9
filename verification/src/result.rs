//! Round result audit.

use crate::VerificationError;
use guardian_consensus::{recompute_tally, ConsensusResult};
use guardian_registry::RegistrySnapshot;
use guardian_types::stake::threshold_weight;
use guardian_types::{ConsensusParams, DataHash, Weight};
use serde::Serialize;
use std::collections::HashSet;

/// What the recorded submissions add up to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TallyReport {
    pub leading_hash: Option<DataHash>,
    pub leading_weight: Weight,
    pub threshold_weight: Weight,
    pub submissions: usize,
    pub reached: bool,
}

/// Re-derive a round's outcome from its recorded submissions.
///
/// Checks that the result used the configured threshold, that every
/// submission is from a distinct oracle and carries a valid signature, and
/// that the recorded hash and weights are what the submissions imply under
/// the threshold and minimum-participation rules. A failed round must carry
/// no consensus weight.
pub fn verify_result(
    result: &ConsensusResult,
    params: &ConsensusParams,
) -> Result<TallyReport, VerificationError> {
    let expected_bps = params.round.consensus_threshold_bps;
    if result.threshold_bps != expected_bps {
        return Err(VerificationError::ThresholdMismatch {
            expected: expected_bps,
            found: result.threshold_bps,
        });
    }

    let mut seen = HashSet::with_capacity(result.submissions.len());
    for s in &result.submissions {
        if !seen.insert(s.oracle) {
            return Err(VerificationError::DuplicateSubmission(s.oracle));
        }
        if !s.verify(result.round_id) {
            return Err(VerificationError::BadSignature(s.oracle));
        }
    }

    let (leading_hash, leading_weight) = recompute_tally(&result.submissions)?;
    if leading_weight != result.leading_weight {
        return Err(VerificationError::TallyMismatch {
            recorded: result.leading_weight,
            recomputed: leading_weight,
        });
    }

    let threshold = threshold_weight(result.total_weight, result.threshold_bps);
    let reached = result.total_weight > 0
        && result.submissions.len() >= params.round.min_oracles
        && leading_weight >= threshold;
    let expected_hash = if reached { leading_hash } else { None };
    if expected_hash != result.consensus_hash {
        return Err(VerificationError::OutcomeMismatch {
            recorded: result.consensus_hash,
            recomputed: expected_hash,
        });
    }
    let expected_weight = reached.then_some(leading_weight);
    if expected_weight != result.consensus_weight {
        return Err(VerificationError::ConsensusWeightMismatch {
            recorded: result.consensus_weight,
            recomputed: expected_weight,
        });
    }

    Ok(TallyReport {
        leading_hash,
        leading_weight,
        threshold_weight: threshold,
        submissions: result.submissions.len(),
        reached,
    })
}

/// Check that every recorded weight matches the oracle's weight in `snapshot`.
pub fn check_submission_weights(
    result: &ConsensusResult,
    snapshot: &RegistrySnapshot,
) -> Result<(), VerificationError> {
    for s in &result.submissions {
        let info = snapshot
            .get(&s.oracle)
            .ok_or(VerificationError::UnknownOracle(s.oracle))?;
        if info.weight() != s.weight {
            return Err(VerificationError::WeightMismatch {
                oracle: s.oracle,
                recorded: s.weight,
                expected: info.weight(),
            });
        }
    }
    Ok(())
}

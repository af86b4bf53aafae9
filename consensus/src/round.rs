//! A single consensus round.
//!
//! Lifecycle: `Open` accepts submissions until either some hash reaches the
//! threshold or the round is finalized from outside (timeout, shutdown). The
//! `Open -> Finalized` transition happens once; later finalize calls are
//! no-ops.

use crate::submission::verify_submission;
use crate::{ConsensusError, ConsensusResult, FailureReason, OracleSubmission, Tally};
use guardian_committee::CommitteeSelection;
use guardian_registry::RegistrySnapshot;
use guardian_types::stake::threshold_weight;
use guardian_types::{DataHash, OracleAddress, RoundId, RoundParams, Signature, Timestamp, Weight};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum RoundState {
    Open {
        submissions: Vec<OracleSubmission>,
        tally: Tally,
    },
    Finalized(ConsensusResult),
}

/// What an accepted submission did to the round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Weight the submission was counted with.
    pub weight: Weight,
    /// Set when this submission finalized the round.
    pub result: Option<ConsensusResult>,
}

/// One round, holding the registry snapshot it was opened against.
#[derive(Clone, Debug)]
pub struct Round {
    id: RoundId,
    snapshot: Arc<RegistrySnapshot>,
    committee: Option<CommitteeSelection>,
    total_weight: Weight,
    threshold: Weight,
    threshold_bps: u32,
    min_oracles: usize,
    started_at: Timestamp,
    deadline: Timestamp,
    state: RoundState,
}

impl Round {
    /// Open a round.
    ///
    /// With a committee the round's total weight is the committee's total
    /// stake; otherwise it is the snapshot's total weight. A zero total is
    /// refused with [`ConsensusError::NoVotingWeight`].
    pub fn open(
        id: RoundId,
        snapshot: Arc<RegistrySnapshot>,
        committee: Option<CommitteeSelection>,
        params: &RoundParams,
        now: Timestamp,
    ) -> Result<Self, ConsensusError> {
        let total_weight = match &committee {
            Some(c) => c.total_stake,
            None => snapshot.total_weight(),
        };
        if total_weight == 0 {
            return Err(ConsensusError::NoVotingWeight);
        }

        Ok(Self {
            id,
            snapshot,
            committee,
            total_weight,
            threshold: threshold_weight(total_weight, params.consensus_threshold_bps),
            threshold_bps: params.consensus_threshold_bps,
            min_oracles: params.min_oracles,
            started_at: now,
            deadline: now.saturating_add_secs(params.submission_window_secs),
            state: RoundState::Open {
                submissions: Vec::new(),
                tally: Tally::new(),
            },
        })
    }

    /// Record a signed report and finalize if the threshold is now met.
    ///
    /// A report arriving at or after the deadline closes the round as
    /// [`FailureReason::WindowExpired`] and is refused as
    /// [`ConsensusError::RoundAlreadyFinalized`]; use [`Round::expire`] first
    /// to get hold of the result.
    ///
    /// Rejected as [`ConsensusError::InvalidSubmission`]: oracles outside the
    /// round's pool or committee, zero-weight oracles and bad signatures.
    /// A second report from the same oracle is
    /// [`ConsensusError::DuplicateSubmission`].
    pub fn submit(
        &mut self,
        oracle: OracleAddress,
        data_hash: DataHash,
        signature: Signature,
        now: Timestamp,
    ) -> Result<SubmitOutcome, ConsensusError> {
        if self.is_expired(now) {
            self.finalize(FailureReason::WindowExpired, now);
        }
        let RoundState::Open { submissions, tally } = &mut self.state else {
            return Err(ConsensusError::RoundAlreadyFinalized(self.id));
        };

        let info = self
            .snapshot
            .get(&oracle)
            .ok_or_else(|| ConsensusError::invalid(oracle, "not in the round's oracle pool"))?;
        if let Some(committee) = &self.committee {
            if !committee.contains(&oracle) {
                return Err(ConsensusError::invalid(oracle, "not a committee member"));
            }
        }
        let weight = info.weight();
        if weight == 0 {
            return Err(ConsensusError::invalid(oracle, "zero voting weight"));
        }
        if submissions.iter().any(|s| s.oracle == oracle) {
            return Err(ConsensusError::DuplicateSubmission(oracle));
        }
        if !verify_submission(self.id, &oracle, &data_hash, &signature) {
            return Err(ConsensusError::invalid(oracle, "signature does not verify"));
        }

        tally.add(data_hash, weight)?;
        submissions.push(OracleSubmission {
            oracle,
            data_hash,
            signature,
            timestamp: now,
            weight,
        });

        let reached = submissions.len() >= self.min_oracles
            && tally.leading().is_some_and(|(_, w)| w >= self.threshold);
        let result = if reached {
            self.finalize(FailureReason::WindowExpired, now)
        } else {
            None
        };
        Ok(SubmitOutcome { weight, result })
    }

    /// Close the round. Returns the result on the first call and `None` once
    /// the round is already finalized.
    ///
    /// The round succeeds if at least `min_oracles` reports arrived and the
    /// leading hash holds the threshold; otherwise it fails with `reason`.
    pub fn finalize(&mut self, reason: FailureReason, now: Timestamp) -> Option<ConsensusResult> {
        let RoundState::Open { submissions, tally } = &mut self.state else {
            return None;
        };

        let submissions = std::mem::take(submissions);
        let leading = tally.leading();
        let reached = submissions.len() >= self.min_oracles
            && leading.is_some_and(|(_, w)| w >= self.threshold);
        let (leading_hash, leading_weight) = match leading {
            Some((h, w)) => (Some(h), w),
            None => (None, 0),
        };

        let result = ConsensusResult {
            round_id: self.id,
            consensus_hash: if reached { leading_hash } else { None },
            consensus_weight: reached.then_some(leading_weight),
            leading_weight,
            total_weight: self.total_weight,
            threshold_bps: self.threshold_bps,
            submissions,
            failure: if reached { None } else { Some(reason) },
            timestamp: now,
        };
        self.state = RoundState::Finalized(result.clone());
        Some(result)
    }

    /// Finalize as [`FailureReason::WindowExpired`] if the deadline has
    /// passed. `None` while the window is open or once already finalized.
    pub fn expire(&mut self, now: Timestamp) -> Option<ConsensusResult> {
        if self.is_expired(now) {
            self.finalize(FailureReason::WindowExpired, now)
        } else {
            None
        }
    }

    pub fn id(&self) -> RoundId {
        self.id
    }

    pub fn snapshot(&self) -> &Arc<RegistrySnapshot> {
        &self.snapshot
    }

    pub fn committee(&self) -> Option<&CommitteeSelection> {
        self.committee.as_ref()
    }

    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    /// Weight a single hash needs to finalize the round.
    pub fn threshold(&self) -> Weight {
        self.threshold
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, RoundState::Finalized(_))
    }

    pub fn result(&self) -> Option<&ConsensusResult> {
        match &self.state {
            RoundState::Finalized(result) => Some(result),
            RoundState::Open { .. } => None,
        }
    }

    pub fn submissions(&self) -> &[OracleSubmission] {
        match &self.state {
            RoundState::Open { submissions, .. } => submissions,
            RoundState::Finalized(result) => &result.submissions,
        }
    }

    /// Current leader, for open and finalized rounds alike.
    pub fn leading(&self) -> Option<(DataHash, Weight)> {
        match &self.state {
            RoundState::Open { tally, .. } => tally.leading(),
            RoundState::Finalized(result) => Tally::from_submissions(&result.submissions)
                .ok()
                .and_then(|t| t.leading()),
        }
    }
}

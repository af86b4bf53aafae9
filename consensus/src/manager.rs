//! Round manager: owns every round of one node.
//!
//! Holds open and recently finalized rounds keyed by round id, routes
//! submissions to them and emits lifecycle events. The manager is
//! synchronous; the node's engine serializes access to it and drives
//! timeouts with its own timers, calling [`RoundManager::finalize_round`].

use crate::events::{ConsensusEvent, EventBus, EventListener};
use crate::round::Round;
use crate::{ConsensusError, ConsensusResult, FailureReason};
use guardian_committee::{CommitteeError, CommitteeSelection, CommitteeSelector};
use guardian_registry::RegistrySnapshot;
use guardian_types::{ConsensusParams, DataHash, OracleAddress, RoundId, Seed, Signature, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default cap on concurrently open rounds.
pub const DEFAULT_MAX_OPEN_ROUNDS: usize = 256;

#[derive(Debug)]
pub struct RoundManager {
    params: ConsensusParams,
    selector: CommitteeSelector,
    rounds: BTreeMap<RoundId, Round>,
    next_round: RoundId,
    max_open_rounds: usize,
    accepting: bool,
    events: EventBus,
}

impl RoundManager {
    /// Validate `params` and build an empty manager. Round ids start at 1.
    pub fn new(params: ConsensusParams) -> Result<Self, ConsensusError> {
        params.validate()?;
        Ok(Self {
            selector: CommitteeSelector::new(params.committee.clone())?,
            params,
            rounds: BTreeMap::new(),
            next_round: RoundId::new(1),
            max_open_rounds: DEFAULT_MAX_OPEN_ROUNDS,
            accepting: true,
            events: EventBus::new(),
        })
    }

    pub fn with_max_open_rounds(mut self, max_open_rounds: usize) -> Self {
        self.max_open_rounds = max_open_rounds;
        self
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn selector(&self) -> &CommitteeSelector {
        &self.selector
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.events.subscribe(listener);
    }

    /// Open the next round against `snapshot`.
    ///
    /// With committee restriction on, a committee is selected first; a pool
    /// too small for it emits `ConsensusFailed { InsufficientEligibleOracles }`
    /// and returns the selector's error. The round id is consumed either way.
    pub fn start_round(
        &mut self,
        snapshot: Arc<RegistrySnapshot>,
        external_seed: Seed,
        now: Timestamp,
    ) -> Result<RoundId, ConsensusError> {
        if !self.accepting {
            return Err(ConsensusError::ShuttingDown);
        }
        if self.open_round_count() >= self.max_open_rounds {
            return Err(ConsensusError::TooManyOpenRounds(self.max_open_rounds));
        }

        let round_id = self.next_round;
        self.next_round = round_id.next();

        let committee = if self.params.round.committee_restricted {
            match self.selector.select_committee(&snapshot, round_id, external_seed, now) {
                Ok(selection) => Some(selection),
                Err(e) => {
                    if matches!(e, CommitteeError::InsufficientPool { .. }) {
                        self.events.emit(&ConsensusEvent::ConsensusFailed {
                            round_id,
                            reason: FailureReason::InsufficientEligibleOracles,
                        });
                    }
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let round = Round::open(round_id, snapshot, committee, &self.params.round, now)?;
        tracing::info!(
            round_id = %round_id,
            total_weight = %round.total_weight(),
            threshold = %round.threshold(),
            deadline = round.deadline().as_secs(),
            "round started"
        );
        self.events.emit(&ConsensusEvent::RoundStarted {
            round_id,
            committee_size: round.committee().map(CommitteeSelection::committee_size),
            total_weight: round.total_weight(),
            threshold: round.threshold(),
        });
        self.rounds.insert(round_id, round);
        Ok(round_id)
    }

    /// Route a signed report to its round.
    ///
    /// Returns the result if this submission finalized the round. A report
    /// arriving after the round's deadline closes the round as
    /// [`FailureReason::WindowExpired`] (announced like any other failure)
    /// and is refused.
    pub fn submit(
        &mut self,
        round_id: RoundId,
        oracle: OracleAddress,
        data_hash: DataHash,
        signature: Signature,
        now: Timestamp,
    ) -> Result<Option<ConsensusResult>, ConsensusError> {
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(ConsensusError::RoundNotFound(round_id))?;

        if let Some(result) = round.expire(now) {
            announce(&self.events, &result);
        }
        let outcome = match round.submit(oracle, data_hash, signature, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(round_id = %round_id, oracle = %oracle, error = %e, "submission rejected");
                return Err(e);
            }
        };

        tracing::debug!(round_id = %round_id, oracle = %oracle, hash = %data_hash, weight = %outcome.weight, "submission accepted");
        self.events.emit(&ConsensusEvent::SubmissionReceived {
            round_id,
            oracle,
            data_hash,
            weight: outcome.weight,
        });
        if let Some(result) = &outcome.result {
            announce(&self.events, result);
        }
        Ok(outcome.result)
    }

    /// Finalize one round from outside (timer, shutdown).
    ///
    /// `Ok(None)` if the round was already finalized.
    pub fn finalize_round(
        &mut self,
        round_id: RoundId,
        reason: FailureReason,
        now: Timestamp,
    ) -> Result<Option<ConsensusResult>, ConsensusError> {
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(ConsensusError::RoundNotFound(round_id))?;
        let result = round.finalize(reason, now);
        if let Some(result) = &result {
            announce(&self.events, result);
        }
        Ok(result)
    }

    /// Finalize every open round whose window has closed at `now`.
    pub fn expire_rounds(&mut self, now: Timestamp) -> Vec<ConsensusResult> {
        let expired: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| !r.is_finalized() && r.is_expired(now))
            .map(Round::id)
            .collect();
        self.finalize_each(&expired, FailureReason::WindowExpired, now)
    }

    /// Stop opening rounds and finalize every open one.
    pub fn finalize_all(&mut self, reason: FailureReason, now: Timestamp) -> Vec<ConsensusResult> {
        self.accepting = false;
        let open = self.open_rounds();
        self.finalize_each(&open, reason, now)
    }

    fn finalize_each(
        &mut self,
        ids: &[RoundId],
        reason: FailureReason,
        now: Timestamp,
    ) -> Vec<ConsensusResult> {
        ids.iter()
            .filter_map(|id| self.finalize_round(*id, reason, now).ok().flatten())
            .collect()
    }

    /// Refuse new rounds from now on.
    pub fn stop_accepting(&mut self) {
        self.accepting = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Drop finalized rounds and committee selections older than
    /// `older_than`. Returns the number of rounds removed.
    pub fn cleanup(&mut self, older_than: Timestamp) -> usize {
        let before = self.rounds.len();
        self.rounds
            .retain(|_, r| r.result().map_or(true, |res| res.timestamp >= older_than));
        let removed = before - self.rounds.len();
        let selections = self.selector.cleanup(older_than);
        if removed > 0 || selections > 0 {
            tracing::debug!(rounds = removed, selections, "round history swept");
        }
        removed
    }

    /// Ids of rounds still accepting submissions.
    pub fn open_rounds(&self) -> Vec<RoundId> {
        self.rounds
            .values()
            .filter(|r| !r.is_finalized())
            .map(Round::id)
            .collect()
    }

    pub fn open_round_count(&self) -> usize {
        self.rounds.values().filter(|r| !r.is_finalized()).count()
    }

    pub fn round(&self, round_id: RoundId) -> Option<&Round> {
        self.rounds.get(&round_id)
    }

    pub fn result(&self, round_id: RoundId) -> Option<&ConsensusResult> {
        self.rounds.get(&round_id).and_then(Round::result)
    }

    pub fn selection(&self, round_id: RoundId) -> Option<&CommitteeSelection> {
        self.selector.selection(round_id)
    }

    pub fn verify_selection(&self, selection: &CommitteeSelection, snapshot: &RegistrySnapshot) -> bool {
        self.selector.verify_selection(selection, snapshot)
    }

    /// The id the next `start_round` will use.
    pub fn next_round_id(&self) -> RoundId {
        self.next_round
    }
}

fn announce(events: &EventBus, result: &ConsensusResult) {
    match (result.consensus_hash, result.consensus_weight) {
        (Some(hash), Some(weight)) => {
            tracing::info!(
                round_id = %result.round_id,
                hash = %hash,
                weight = %weight,
                total_weight = %result.total_weight,
                submissions = result.submissions.len(),
                "consensus reached"
            );
            events.emit(&ConsensusEvent::ConsensusReached {
                round_id: result.round_id,
                data_hash: hash,
                weight,
                total_weight: result.total_weight,
            });
        }
        _ => {
            let reason = result.failure.unwrap_or(FailureReason::WindowExpired);
            tracing::info!(
                round_id = %result.round_id,
                %reason,
                leading_weight = %result.leading_weight,
                submissions = result.submissions.len(),
                "consensus failed"
            );
            events.emit(&ConsensusEvent::ConsensusFailed {
                round_id: result.round_id,
                reason,
            });
        }
    }
}

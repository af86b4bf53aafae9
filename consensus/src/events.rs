//! Round lifecycle events for subscribers.

use crate::FailureReason;
use guardian_types::{DataHash, OracleAddress, RoundId, Weight};
use serde::Serialize;
use std::fmt;

/// Events observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusEvent {
    /// A round opened. `committee_size` is `None` for pool-wide rounds.
    RoundStarted {
        round_id: RoundId,
        committee_size: Option<usize>,
        total_weight: Weight,
        threshold: Weight,
    },
    /// A submission was accepted into an open round.
    SubmissionReceived {
        round_id: RoundId,
        oracle: OracleAddress,
        data_hash: DataHash,
        weight: Weight,
    },
    /// A hash reached the threshold.
    ConsensusReached {
        round_id: RoundId,
        data_hash: DataHash,
        weight: Weight,
        total_weight: Weight,
    },
    /// The round ended (or could not start) without consensus.
    ConsensusFailed {
        round_id: RoundId,
        reason: FailureReason,
    },
}

impl ConsensusEvent {
    pub fn round_id(&self) -> RoundId {
        match self {
            ConsensusEvent::RoundStarted { round_id, .. }
            | ConsensusEvent::SubmissionReceived { round_id, .. }
            | ConsensusEvent::ConsensusReached { round_id, .. }
            | ConsensusEvent::ConsensusFailed { round_id, .. } => *round_id,
        }
    }
}

pub type EventListener = Box<dyn Fn(&ConsensusEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the thread that drives the round manager, while
/// the manager is borrowed: they must be fast and must not call back into it.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<EventListener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ConsensusEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

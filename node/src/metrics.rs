//! Prometheus metrics for the guardian engine.
//!
//! Counters are fed from consensus events; the open-rounds gauge is set by the
//! engine after every state change.

use crate::NodeError;
use guardian_consensus::ConsensusEvent;
use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, IntCounter, IntGauge, Registry,
    TextEncoder,
};

pub struct NodeMetrics {
    registry: Registry,

    pub rounds_started: IntCounter,
    pub consensus_reached: IntCounter,
    pub consensus_failed: IntCounter,
    pub submissions_accepted: IntCounter,
    pub submissions_rejected: IntCounter,
    pub refresh_failures: IntCounter,
    pub anchor_failures: IntCounter,

    pub open_rounds: IntGauge,
    pub registry_oracles: IntGauge,

    /// Submissions counted by the time a round finalized.
    pub round_participation: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new_custom(Some("guardian".into()), None)?;

        let rounds_started = register_int_counter_with_registry!(
            "rounds_started_total",
            "Consensus rounds opened",
            registry
        )?;
        let consensus_reached = register_int_counter_with_registry!(
            "consensus_reached_total",
            "Rounds finalized with an agreed hash",
            registry
        )?;
        let consensus_failed = register_int_counter_with_registry!(
            "consensus_failed_total",
            "Rounds finalized without agreement",
            registry
        )?;
        let submissions_accepted = register_int_counter_with_registry!(
            "submissions_accepted_total",
            "Oracle submissions counted",
            registry
        )?;
        let submissions_rejected = register_int_counter_with_registry!(
            "submissions_rejected_total",
            "Oracle submissions refused",
            registry
        )?;
        let refresh_failures = register_int_counter_with_registry!(
            "registry_refresh_failures_total",
            "Failed registry refresh attempts",
            registry
        )?;
        let anchor_failures = register_int_counter_with_registry!(
            "anchor_failures_total",
            "Consensus results the gateway did not accept",
            registry
        )?;
        let open_rounds =
            register_int_gauge_with_registry!("open_rounds", "Rounds accepting submissions", registry)?;
        let registry_oracles = register_int_gauge_with_registry!(
            "registry_oracles",
            "Eligible oracles in the current snapshot",
            registry
        )?;
        let round_participation = register_histogram_with_registry!(
            "round_participation",
            "Submissions per finalized round",
            vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0],
            registry
        )?;

        Ok(Self {
            registry,
            rounds_started,
            consensus_reached,
            consensus_failed,
            submissions_accepted,
            submissions_rejected,
            refresh_failures,
            anchor_failures,
            open_rounds,
            registry_oracles,
            round_participation,
        })
    }

    /// Update counters for one consensus event.
    pub fn record_event(&self, event: &ConsensusEvent) {
        match event {
            ConsensusEvent::RoundStarted { .. } => self.rounds_started.inc(),
            ConsensusEvent::SubmissionReceived { .. } => self.submissions_accepted.inc(),
            ConsensusEvent::ConsensusReached { .. } => self.consensus_reached.inc(),
            ConsensusEvent::ConsensusFailed { .. } => self.consensus_failed.inc(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every metric.
    pub fn gather_text(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| NodeError::Config(e.to_string()))
    }
}

impl std::fmt::Debug for NodeMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMetrics")
            .field("rounds_started", &self.rounds_started.get())
            .field("open_rounds", &self.open_rounds.get())
            .finish_non_exhaustive()
    }
}

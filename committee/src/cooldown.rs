//! Committee rotation.

use guardian_types::{OracleAddress, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remembers which oracles sat on the committees of the most recent rounds.
///
/// An oracle selected in round `r` is cooling down for rounds
/// `r + 1 ..= r + periods`. Only the rounds that can still exclude someone
/// are kept, so the tracker never holds more than `periods` entries.
///
/// The tracker is part of the selection inputs: an observer recomputing a
/// selection needs the tracker state as it was before that round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownTracker {
    periods: u64,
    recent: BTreeMap<RoundId, Vec<OracleAddress>>,
}

impl CooldownTracker {
    pub fn new(periods: u64) -> Self {
        Self {
            periods,
            recent: BTreeMap::new(),
        }
    }

    pub fn periods(&self) -> u64 {
        self.periods
    }

    /// Whether `oracle` is excluded from the committee of `round`.
    pub fn is_cooling_down(&self, oracle: &OracleAddress, round: RoundId) -> bool {
        if self.periods == 0 {
            return false;
        }
        self.recent
            .range(..round)
            .rev()
            .take_while(|(r, _)| round.distance_from(**r) <= self.periods)
            .any(|(_, members)| members.contains(oracle))
    }

    /// Record the committee of `round` and drop rounds that can no longer
    /// exclude anyone.
    pub fn record(&mut self, round: RoundId, members: &[OracleAddress]) {
        if self.periods == 0 {
            return;
        }
        self.recent.insert(round, members.to_vec());
        let Some(latest) = self.recent.keys().next_back().copied() else {
            return;
        };
        let periods = self.periods;
        self.recent.retain(|r, _| latest.distance_from(*r) < periods);
    }

    /// Rounds currently tracked, oldest first.
    pub fn tracked_rounds(&self) -> impl Iterator<Item = RoundId> + '_ {
        self.recent.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

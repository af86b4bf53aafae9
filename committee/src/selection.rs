//! The committee selection record.

use guardian_types::{OracleAddress, RoundId, Seed, SelectionProof, Stake, Timestamp};
use serde::{Deserialize, Serialize};

/// The committee chosen for one round, with everything an observer needs to
/// recompute it.
///
/// `selected_oracles` is kept sorted by address. `total_stake` is the stake of
/// the members as seen in the snapshot the selection was drawn from, and is
/// the denominator for committee-restricted rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeSelection {
    pub round_id: RoundId,
    pub external_seed: Seed,
    pub seed: Seed,
    pub selected_oracles: Vec<OracleAddress>,
    pub total_stake: Stake,
    pub selection_proof: SelectionProof,
    pub timestamp: Timestamp,
}

impl CommitteeSelection {
    pub fn committee_size(&self) -> usize {
        self.selected_oracles.len()
    }

    pub fn contains(&self, oracle: &OracleAddress) -> bool {
        self.selected_oracles.binary_search(oracle).is_ok()
    }
}

//! Committee selection over a registry snapshot.

use crate::{
    compute_selection_proof, sample_committee, CommitteeError, CommitteeSelection, CooldownTracker,
    SelectionFault,
};
use guardian_registry::RegistrySnapshot;
use guardian_types::stake::checked_sum;
use guardian_types::{CommitteeParams, OracleAddress, RoundId, Seed, Stake, Timestamp};
use guardian_vrf::derive_round_seed;
use std::collections::BTreeMap;

/// Select the committee for `round_id` without touching any state.
///
/// Candidates are the snapshot's eligible oracles (address order) minus those
/// `cooldown` excludes for this round. The same inputs always give the same
/// members and proof; only `timestamp` reflects `now`.
pub fn compute_selection(
    snapshot: &RegistrySnapshot,
    cooldown: &CooldownTracker,
    params: &CommitteeParams,
    round_id: RoundId,
    external_seed: Seed,
    now: Timestamp,
) -> Result<CommitteeSelection, CommitteeError> {
    let seed = derive_round_seed(round_id, &external_seed);
    let candidates: Vec<(OracleAddress, Stake)> = snapshot
        .iter()
        .filter(|o| !cooldown.is_cooling_down(o.address(), round_id))
        .map(|o| (*o.address(), o.stake()))
        .collect();

    let target = params.target_committee_size.min(params.max_committee_size);
    let mut selected = sample_committee(
        &candidates,
        &seed,
        params.weighting,
        target,
        params.min_committee_size,
    )?;
    selected.sort_unstable();

    let total_stake = checked_sum(
        selected
            .iter()
            .filter_map(|a| snapshot.get(a))
            .map(|o| o.stake()),
    )?;
    let selection_proof = compute_selection_proof(round_id, &seed, &selected);

    Ok(CommitteeSelection {
        round_id,
        external_seed,
        seed,
        selected_oracles: selected,
        total_stake,
        selection_proof,
        timestamp: now,
    })
}

/// Check a selection using only its own fields, the size bounds and the pool.
///
/// Verifies that the seed derives from the round id and external seed, that
/// the proof matches the member set, that the size is in bounds with no
/// repeated member, that every member is in `snapshot`, and that
/// `total_stake` is the members' stake in `snapshot`.
pub fn check_selection(
    selection: &CommitteeSelection,
    snapshot: &RegistrySnapshot,
    params: &CommitteeParams,
) -> Result<(), SelectionFault> {
    if derive_round_seed(selection.round_id, &selection.external_seed) != selection.seed {
        return Err(SelectionFault::SeedMismatch);
    }

    let size = selection.committee_size();
    if !params.size_in_bounds(size) {
        return Err(SelectionFault::SizeOutOfBounds {
            size,
            min: params.min_committee_size,
            max: params.max_committee_size,
        });
    }

    let mut sorted = selection.selected_oracles.clone();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(SelectionFault::DuplicateOracle(pair[0]));
    }

    let proof = compute_selection_proof(selection.round_id, &selection.seed, &sorted);
    if proof != selection.selection_proof {
        return Err(SelectionFault::ProofMismatch);
    }

    if let Some(missing) = sorted.iter().find(|a| !snapshot.contains(a)) {
        return Err(SelectionFault::UnknownOracle(*missing));
    }

    let expected = checked_sum(
        sorted
            .iter()
            .filter_map(|a| snapshot.get(a))
            .map(|o| o.stake()),
    )
    .ok();
    if expected != Some(selection.total_stake) {
        return Err(SelectionFault::StakeMismatch {
            recorded: selection.total_stake,
            expected,
        });
    }
    Ok(())
}

/// Stateful selector: applies rotation and keeps recent selections.
///
/// Selections are retained by round id until [`cleanup`] evicts them.
///
/// [`cleanup`]: CommitteeSelector::cleanup
#[derive(Debug)]
pub struct CommitteeSelector {
    params: CommitteeParams,
    cooldown: CooldownTracker,
    history: BTreeMap<RoundId, CommitteeSelection>,
}

impl CommitteeSelector {
    pub fn new(params: CommitteeParams) -> Result<Self, CommitteeError> {
        params.validate()?;
        Ok(Self {
            cooldown: CooldownTracker::new(params.cooldown_periods),
            params,
            history: BTreeMap::new(),
        })
    }

    pub fn params(&self) -> &CommitteeParams {
        &self.params
    }

    /// Rotation state, as needed to recompute the next selection.
    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    /// Select and record the committee for `round_id`.
    ///
    /// A round can be selected once; the members then cool down for the
    /// configured number of rounds.
    pub fn select_committee(
        &mut self,
        snapshot: &RegistrySnapshot,
        round_id: RoundId,
        external_seed: Seed,
        now: Timestamp,
    ) -> Result<CommitteeSelection, CommitteeError> {
        if self.history.contains_key(&round_id) {
            return Err(CommitteeError::RoundAlreadySelected(round_id));
        }

        let selection = match compute_selection(
            snapshot,
            &self.cooldown,
            &self.params,
            round_id,
            external_seed,
            now,
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(round_id = %round_id, pool = snapshot.len(), error = %e, "committee selection failed");
                return Err(e);
            }
        };

        self.cooldown.record(round_id, &selection.selected_oracles);
        self.history.insert(round_id, selection.clone());

        tracing::info!(
            round_id = %round_id,
            size = selection.committee_size(),
            total_stake = %selection.total_stake,
            proof = %selection.selection_proof,
            "committee selected"
        );
        Ok(selection)
    }

    /// Whether `selection` checks out against `snapshot` under this
    /// selector's size bounds.
    pub fn verify_selection(&self, selection: &CommitteeSelection, snapshot: &RegistrySnapshot) -> bool {
        match check_selection(selection, snapshot, &self.params) {
            Ok(()) => true,
            Err(fault) => {
                tracing::debug!(round_id = %selection.round_id, %fault, "selection rejected");
                false
            }
        }
    }

    pub fn selection(&self, round_id: RoundId) -> Option<&CommitteeSelection> {
        self.history.get(&round_id)
    }

    /// Drop selections made before `older_than`. Returns how many were removed.
    pub fn cleanup(&mut self, older_than: Timestamp) -> usize {
        let before = self.history.len();
        self.history.retain(|_, s| s.timestamp >= older_than);
        let removed = before - self.history.len();
        if removed > 0 {
            tracing::debug!(removed, "selection history swept");
        }
        removed
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

//! Selection checks.

use crate::VerificationError;
use guardian_committee::{check_selection, compute_selection, CommitteeSelection, CooldownTracker, SelectionFault};
use guardian_registry::RegistrySnapshot;
use guardian_types::CommitteeParams;

/// Check a selection's seed, proof, size bounds, membership and total stake.
pub fn verify_selection(
    selection: &CommitteeSelection,
    snapshot: &RegistrySnapshot,
    params: &CommitteeParams,
) -> bool {
    check_selection(selection, snapshot, params).is_ok()
}

/// Rerun the sampler and require the exact same committee.
///
/// `snapshot` and `cooldown` must be the pool and rotation state the
/// selector saw when it drew `selection`.
pub fn recompute_selection(
    selection: &CommitteeSelection,
    snapshot: &RegistrySnapshot,
    cooldown: &CooldownTracker,
    params: &CommitteeParams,
) -> Result<(), VerificationError> {
    check_selection(selection, snapshot, params)?;
    let recomputed = compute_selection(
        snapshot,
        cooldown,
        params,
        selection.round_id,
        selection.external_seed,
        selection.timestamp,
    )?;
    if recomputed.selected_oracles != selection.selected_oracles
        || recomputed.selection_proof != selection.selection_proof
    {
        return Err(SelectionFault::CommitteeMismatch.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_committee::compute_selection_proof;
    use guardian_registry::OracleInfo;
    use guardian_types::{OracleAddress, Reputation, RoundId, Seed, Timestamp};

    fn snapshot(n: u8) -> RegistrySnapshot {
        let oracles = (1..=n).map(|i| OracleInfo::new(OracleAddress::new([i; 32]), i as u128 * 10, Reputation::MAX));
        RegistrySnapshot::from_oracles(oracles, 1, Timestamp::EPOCH).unwrap()
    }

    fn params() -> CommitteeParams {
        CommitteeParams {
            min_committee_size: 4,
            max_committee_size: 6,
            target_committee_size: 5,
            cooldown_periods: 1,
            ..CommitteeParams::default()
        }
    }

    #[test]
    fn recompute_matches_with_same_cooldown_state() {
        let snap = snapshot(12);
        let p = params();
        let mut cooldown = CooldownTracker::new(1);
        let first = compute_selection(&snap, &cooldown, &p, RoundId::new(1), Seed::new([1; 32]), Timestamp::EPOCH).unwrap();
        cooldown.record(RoundId::new(1), &first.selected_oracles);
        let second = compute_selection(&snap, &cooldown, &p, RoundId::new(2), Seed::new([2; 32]), Timestamp::EPOCH).unwrap();

        assert!(recompute_selection(&second, &snap, &cooldown, &p).is_ok());
        assert!(verify_selection(&second, &snap, &p));
    }

    #[test]
    fn reproofed_forgery_fails_recompute() {
        let snap = snapshot(12);
        let p = params();
        let cooldown = CooldownTracker::new(1);
        let real = compute_selection(&snap, &cooldown, &p, RoundId::new(1), Seed::new([1; 32]), Timestamp::EPOCH).unwrap();

        let outsider = snap.iter().map(|o| *o.address()).find(|a| !real.contains(a)).unwrap();
        let mut forged = real.clone();
        forged.selected_oracles[0] = outsider;
        forged.selected_oracles.sort();
        forged.selection_proof = compute_selection_proof(forged.round_id, &forged.seed, &forged.selected_oracles);
        forged.total_stake = forged.selected_oracles.iter().map(|a| snap.get(a).unwrap().stake()).sum();

        // self-consistent, so only a rerun of the sampler catches it
        assert!(verify_selection(&forged, &snap, &p));
        assert_eq!(
            recompute_selection(&forged, &snap, &cooldown, &p),
            Err(VerificationError::Selection(SelectionFault::CommitteeMismatch))
        );
    }

    #[test]
    fn tampered_total_stake_fails_both_checks() {
        let snap = snapshot(12);
        let p = params();
        let cooldown = CooldownTracker::new(1);
        let mut sel = compute_selection(&snap, &cooldown, &p, RoundId::new(1), Seed::new([1; 32]), Timestamp::EPOCH).unwrap();
        let honest = sel.total_stake;
        sel.total_stake = honest + 1_000;

        assert!(!verify_selection(&sel, &snap, &p));
        assert_eq!(
            recompute_selection(&sel, &snap, &cooldown, &p),
            Err(VerificationError::Selection(SelectionFault::StakeMismatch {
                recorded: honest + 1_000,
                expected: Some(honest),
            }))
        );
    }
}

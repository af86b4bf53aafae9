//! Weighted sampling without replacement.
//!
//! Candidates are walked in the order given (the registry's address order).
//! Each weighted draw takes the current chain value modulo the remaining
//! stake and picks the first candidate whose cumulative-stake interval
//! `[cum_prev, cum)` contains it; zero-stake candidates have an empty
//! interval and are only reachable through uniform draws. When no stake
//! remains, or in uniform mode, the draw is the chain value modulo the number
//! of remaining candidates. The chain advances once per pick.

use crate::CommitteeError;
use guardian_types::stake::checked_sum;
use guardian_types::{OracleAddress, Seed, SelectionWeighting, Stake};
use guardian_vrf::DrawChain;

/// Draw a committee from `candidates`.
///
/// Weighted draws continue until `target` members are picked or the
/// candidates run out; uniform top-up draws then continue until `min` is
/// reached. Returns members in draw order.
///
/// # Errors
///
/// [`CommitteeError::InsufficientPool`] if fewer than `min` candidates exist,
/// [`CommitteeError::StakeOverflow`] if the candidate stake does not fit a `u128`.
pub fn sample_committee(
    candidates: &[(OracleAddress, Stake)],
    round_seed: &Seed,
    weighting: SelectionWeighting,
    target: usize,
    min: usize,
) -> Result<Vec<OracleAddress>, CommitteeError> {
    if candidates.len() < min {
        return Err(CommitteeError::InsufficientPool {
            eligible: candidates.len(),
            required: min,
        });
    }

    let mut remaining = candidates.to_vec();
    let mut remaining_stake = checked_sum(remaining.iter().map(|(_, s)| *s))?;
    let mut chain = DrawChain::new(round_seed);
    let mut selected = Vec::with_capacity(target.max(min));

    while selected.len() < target && !remaining.is_empty() {
        let index = match weighting {
            SelectionWeighting::Stake if remaining_stake > 0 => {
                let draw = chain.draw_below(remaining_stake)?;
                pick_by_stake(&remaining, draw)
            }
            _ => chain.draw_index(remaining.len())?,
        };
        let (address, stake) = remaining.remove(index);
        remaining_stake -= stake;
        selected.push(address);
        chain.advance();
    }

    while selected.len() < min {
        if remaining.is_empty() {
            return Err(CommitteeError::InsufficientPool {
                eligible: candidates.len(),
                required: min,
            });
        }
        let index = chain.draw_index(remaining.len())?;
        let (address, _) = remaining.remove(index);
        selected.push(address);
        chain.advance();
    }

    Ok(selected)
}

/// Index of the first candidate whose cumulative-stake interval contains `draw`.
fn pick_by_stake(candidates: &[(OracleAddress, Stake)], draw: u128) -> usize {
    let mut cumulative: u128 = 0;
    for (i, (_, stake)) in candidates.iter().enumerate() {
        cumulative += stake;
        if draw < cumulative {
            return i;
        }
    }
    // draw < total stake, so the loop always returns
    candidates.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_crypto::blake2b_256;

    fn addr(b: u8) -> OracleAddress {
        OracleAddress::new([b; 32])
    }

    fn pool(stakes: &[Stake]) -> Vec<(OracleAddress, Stake)> {
        stakes
            .iter()
            .enumerate()
            .map(|(i, s)| (addr(i as u8 + 1), *s))
            .collect()
    }

    #[test]
    fn interval_walk_picks_first_containing() {
        let c = pool(&[10, 0, 5]);
        assert_eq!(pick_by_stake(&c, 0), 0);
        assert_eq!(pick_by_stake(&c, 9), 0);
        // the zero-stake candidate has an empty interval
        assert_eq!(pick_by_stake(&c, 10), 2);
        assert_eq!(pick_by_stake(&c, 14), 2);
    }

    #[test]
    fn no_duplicates_and_target_respected() {
        let c = pool(&[5, 1, 9, 3, 7, 2, 8]);
        let picked =
            sample_committee(&c, &Seed::new([4; 32]), SelectionWeighting::Stake, 5, 4).unwrap();
        assert_eq!(picked.len(), 5);
        let mut dedup = picked.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 5);
    }

    #[test]
    fn zero_stake_pool_falls_back_to_uniform() {
        let c = pool(&[0, 0, 0, 0, 0]);
        let picked =
            sample_committee(&c, &Seed::new([4; 32]), SelectionWeighting::Stake, 4, 4).unwrap();
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn zero_stake_members_reached_after_stake_exhausted() {
        // two staked and two zero-stake candidates, target four
        let c = pool(&[50, 0, 50, 0]);
        let picked =
            sample_committee(&c, &Seed::new([6; 32]), SelectionWeighting::Stake, 4, 4).unwrap();
        assert_eq!(picked[..2].iter().filter(|a| **a == addr(1) || **a == addr(3)).count(), 2);
        assert!(picked.contains(&addr(2)) && picked.contains(&addr(4)));
    }

    #[test]
    fn top_up_reaches_minimum() {
        let c = pool(&[1, 2, 3, 4, 5, 6]);
        let picked =
            sample_committee(&c, &Seed::new([1; 32]), SelectionWeighting::Stake, 2, 5).unwrap();
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn pool_below_minimum_fails() {
        let c = pool(&[1, 2, 3]);
        let err =
            sample_committee(&c, &Seed::new([1; 32]), SelectionWeighting::Stake, 4, 4).unwrap_err();
        assert_eq!(err, CommitteeError::InsufficientPool { eligible: 3, required: 4 });
    }

    #[test]
    fn stake_overflow_detected() {
        let c = pool(&[u128::MAX, 1, 1, 1]);
        let err =
            sample_committee(&c, &Seed::new([1; 32]), SelectionWeighting::Stake, 4, 4).unwrap_err();
        assert_eq!(err, CommitteeError::StakeOverflow);
    }

    #[test]
    fn first_pick_frequency_tracks_stake() {
        // one candidate holds half the stake, four share the rest
        let c = pool(&[400, 100, 100, 100, 100]);
        let mut counts = [0u32; 5];
        let trials = 4_000u32;
        for i in 0..trials {
            let seed = Seed::new(blake2b_256(&i.to_be_bytes()));
            let picked = sample_committee(&c, &seed, SelectionWeighting::Stake, 1, 1).unwrap();
            let idx = (picked[0].as_bytes()[0] - 1) as usize;
            counts[idx] += 1;
        }
        // expected 2000 and 500 each; allow roughly five standard deviations
        assert!((1_840..=2_160).contains(&counts[0]), "heavy: {}", counts[0]);
        for c in &counts[1..] {
            assert!((400..=600).contains(c), "light: {c}");
        }
    }

    #[test]
    fn uniform_mode_ignores_stake() {
        let c = pool(&[1_000_000, 1, 1, 1, 1]);
        let mut heavy = 0u32;
        let trials = 2_000u32;
        for i in 0..trials {
            let seed = Seed::new(blake2b_256(&i.to_le_bytes()));
            let picked = sample_committee(&c, &seed, SelectionWeighting::Uniform, 1, 1).unwrap();
            if picked[0] == addr(1) {
                heavy += 1;
            }
        }
        // expected 400
        assert!((300..=500).contains(&heavy), "heavy: {heavy}");
    }
}

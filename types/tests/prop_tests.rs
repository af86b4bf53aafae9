use proptest::prelude::*;

use guardian_types::stake::{threshold_weight, BPS_DENOMINATOR};
use guardian_types::{OracleAddress, Reputation, RoundId, Timestamp};

proptest! {
    /// threshold_weight is the least weight whose share reaches the fraction.
    #[test]
    fn threshold_is_minimal_ceiling(total in 0u128..1_000_000_000_000, bps in 5_001u32..=10_000) {
        let t = threshold_weight(total, bps);
        prop_assert!(t * BPS_DENOMINATOR >= total * bps as u128);
        if t > 0 {
            prop_assert!((t - 1) * BPS_DENOMINATOR < total * bps as u128);
        }
    }

    /// Above 50%, two disjoint tallies can never both meet the threshold.
    #[test]
    fn threshold_admits_single_winner(total in 1u128..1_000_000_000, bps in 5_001u32..=10_000) {
        let t = threshold_weight(total, bps);
        prop_assert!(t.saturating_mul(2) > total);
    }

    /// weight_of matches the naive formula wherever the naive formula fits.
    #[test]
    fn weight_matches_naive(stake in 0u128..(u128::MAX / 10_000), rep in 0u32..=10_000) {
        let r = Reputation::new(rep).unwrap();
        prop_assert_eq!(r.weight_of(stake), stake * rep as u128 / BPS_DENOMINATOR);
    }

    /// weight never exceeds stake.
    #[test]
    fn weight_bounded_by_stake(stake in any::<u128>(), rep in 0u32..=10_000) {
        let r = Reputation::new(rep).unwrap();
        prop_assert!(r.weight_of(stake) <= stake);
    }

    /// Address text form parses back to the same bytes.
    #[test]
    fn address_text_round_trip(bytes in prop::array::uniform32(0u8..)) {
        let addr = OracleAddress::new(bytes);
        prop_assert_eq!(addr.to_string().parse::<OracleAddress>().unwrap(), addr);
    }

    /// RoundId distance is the saturating difference.
    #[test]
    fn round_distance(a in 0u64..1_000_000, d in 0u64..1_000_000) {
        let earlier = RoundId::new(a);
        let later = RoundId::new(a + d);
        prop_assert_eq!(later.distance_from(earlier), d);
        prop_assert_eq!(earlier.distance_from(later), 0);
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired(base in 0u64..1_000_000, dur in 0u64..1_000_000, now in 0u64..3_000_000) {
        let t = Timestamp::new(base);
        prop_assert_eq!(t.has_expired(dur, Timestamp::new(now)), now >= base + dur);
    }
}

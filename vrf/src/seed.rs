//! Round seed derivation.

use guardian_crypto::blake2b_256_multi;
use guardian_types::{RoundId, Seed};

/// Domain separation tag for round seeds.
const ROUND_SEED_TAG: &[u8] = b"guardian/round-seed/v1";

/// Derive the round seed from the round id and an externally sourced seed.
///
/// The round id is bound in so the same block hash never yields the same
/// committee for two different rounds.
pub fn derive_round_seed(round_id: RoundId, external_seed: &Seed) -> Seed {
    Seed::new(blake2b_256_multi(&[
        ROUND_SEED_TAG,
        &round_id.to_be_bytes(),
        external_seed.as_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let ext = Seed::new([9u8; 32]);
        assert_eq!(
            derive_round_seed(RoundId::new(1), &ext),
            derive_round_seed(RoundId::new(1), &ext)
        );
    }

    #[test]
    fn round_id_changes_seed() {
        let ext = Seed::new([9u8; 32]);
        assert_ne!(
            derive_round_seed(RoundId::new(1), &ext),
            derive_round_seed(RoundId::new(2), &ext)
        );
    }

    #[test]
    fn external_seed_changes_seed() {
        assert_ne!(
            derive_round_seed(RoundId::new(1), &Seed::new([1u8; 32])),
            derive_round_seed(RoundId::new(1), &Seed::new([2u8; 32]))
        );
    }
}

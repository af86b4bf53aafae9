//! Selection proof.

use guardian_crypto::blake2b_256_multi;
use guardian_types::{OracleAddress, RoundId, Seed, SelectionProof};

const SELECTION_PROOF_TAG: &[u8] = b"guardian/selection-proof/v1";

/// `H(tag ‖ round_id ‖ seed ‖ count ‖ sorted(addresses))`.
///
/// Addresses are sorted first, so the proof commits to the committee as a set
/// regardless of draw order.
pub fn compute_selection_proof(
    round_id: RoundId,
    seed: &Seed,
    oracles: &[OracleAddress],
) -> SelectionProof {
    let mut sorted = oracles.to_vec();
    sorted.sort_unstable();

    let round = round_id.to_be_bytes();
    let count = (sorted.len() as u32).to_be_bytes();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(sorted.len() + 4);
    parts.push(SELECTION_PROOF_TAG);
    parts.push(&round);
    parts.push(seed.as_bytes());
    parts.push(&count);
    parts.extend(sorted.iter().map(|a| a.as_bytes().as_slice()));

    SelectionProof::new(blake2b_256_multi(&parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> OracleAddress {
        OracleAddress::new([b; 32])
    }

    #[test]
    fn order_independent() {
        let seed = Seed::new([1; 32]);
        let a = compute_selection_proof(RoundId::new(1), &seed, &[addr(1), addr(2), addr(3)]);
        let b = compute_selection_proof(RoundId::new(1), &seed, &[addr(3), addr(1), addr(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn binds_every_input() {
        let seed = Seed::new([1; 32]);
        let base = compute_selection_proof(RoundId::new(1), &seed, &[addr(1), addr(2)]);
        assert_ne!(base, compute_selection_proof(RoundId::new(2), &seed, &[addr(1), addr(2)]));
        assert_ne!(
            base,
            compute_selection_proof(RoundId::new(1), &Seed::new([2; 32]), &[addr(1), addr(2)])
        );
        assert_ne!(base, compute_selection_proof(RoundId::new(1), &seed, &[addr(1), addr(4)]));
        assert_ne!(base, compute_selection_proof(RoundId::new(1), &seed, &[addr(1)]));
    }
}

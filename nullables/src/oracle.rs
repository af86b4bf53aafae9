//! Deterministic oracle identities.

use crate::NullGateway;
use guardian_consensus::sign_submission;
use guardian_crypto::{blake2b_256_multi, keypair_from_seed};
use guardian_types::{DataHash, KeyPair, OracleAddress, Reputation, RoundId, Signature, Stake};

const TEST_ORACLE_TAG: &[u8] = b"guardian/test-oracle";

/// An oracle whose key is derived from its index.
pub struct TestOracle {
    index: u32,
    keys: KeyPair,
}

impl TestOracle {
    pub fn new(index: u32) -> Self {
        let seed = blake2b_256_multi(&[TEST_ORACLE_TAG, &index.to_be_bytes()]);
        Self {
            index,
            keys: keypair_from_seed(&seed),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn address(&self) -> OracleAddress {
        OracleAddress::from_public_key(&self.keys.public)
    }

    /// Sign a report of `data_hash` for `round_id`.
    pub fn sign(&self, round_id: RoundId, data_hash: &DataHash) -> Signature {
        sign_submission(round_id, data_hash, &self.keys.private)
    }
}

/// Oracles `0..stakes.len()` registered on a fresh gateway at full
/// reputation.
pub fn test_pool(stakes: &[Stake]) -> (Vec<TestOracle>, NullGateway) {
    let gateway = NullGateway::new();
    let oracles: Vec<TestOracle> = stakes
        .iter()
        .enumerate()
        .map(|(i, stake)| {
            let oracle = TestOracle::new(i as u32);
            gateway.add_oracle(oracle.address(), *stake, Reputation::MAX);
            oracle
        })
        .collect();
    (oracles, gateway)
}

//! Signed oracle submissions.

use guardian_crypto::{blake2b_256_multi, sign_message, verify_signature};
use guardian_types::{DataHash, OracleAddress, PrivateKey, RoundId, Signature, Timestamp, Weight};
use serde::{Deserialize, Serialize};

const SUBMISSION_TAG: &[u8] = b"guardian-submission";

/// The 32-byte message an oracle signs to report `data_hash` for `round_id`.
pub fn submission_message(round_id: RoundId, data_hash: &DataHash) -> [u8; 32] {
    blake2b_256_multi(&[SUBMISSION_TAG, &round_id.to_be_bytes(), data_hash.as_bytes()])
}

/// Sign a report with the oracle's key.
pub fn sign_submission(round_id: RoundId, data_hash: &DataHash, key: &PrivateKey) -> Signature {
    sign_message(&submission_message(round_id, data_hash), key)
}

/// Check `signature` against the oracle's address, which is its public key.
pub fn verify_submission(
    round_id: RoundId,
    oracle: &OracleAddress,
    data_hash: &DataHash,
    signature: &Signature,
) -> bool {
    verify_signature(
        &submission_message(round_id, data_hash),
        signature,
        &oracle.as_public_key(),
    )
}

/// An accepted report. `weight` is the oracle's weight in the round's
/// snapshot at the time of submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSubmission {
    pub oracle: OracleAddress,
    pub data_hash: DataHash,
    pub signature: Signature,
    pub timestamp: Timestamp,
    pub weight: Weight,
}

impl OracleSubmission {
    /// Re-check the signature for `round_id`.
    pub fn verify(&self, round_id: RoundId) -> bool {
        verify_submission(round_id, &self.oracle, &self.data_hash, &self.signature)
    }
}

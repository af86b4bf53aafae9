//! Fundamental types for the guardian oracle network.
//!
//! Shared by every other crate in the workspace: oracle addresses, 32-byte
//! hashes, round identifiers, timestamps, key material, checked stake/weight
//! arithmetic and the consensus parameter set.

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod round;
pub mod stake;
pub mod time;

pub use address::OracleAddress;
pub use error::TypesError;
pub use hash::{DataHash, Seed, SelectionProof};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{CommitteeParams, ConsensusParams, RoundParams, SelectionWeighting};
pub use round::RoundId;
pub use stake::{Reputation, Stake, Weight, BPS_DENOMINATOR};
pub use time::{Clock, SystemClock, Timestamp};

//! Cryptographic primitives for the guardian network.
//!
//! - **Blake2b-256** for every protocol hash (round seeds, draw chain,
//!   selection proofs, submission messages)
//! - **Ed25519** for submission signatures; an oracle's address is its
//!   public key

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};

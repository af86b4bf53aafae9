//! Verifiable randomness for committee selection.
//!
//! Nothing here is secret: every value is derived from public inputs, so any
//! observer holding the round id and the external seed (a block hash no single
//! oracle controls) reproduces exactly the same draws.
//!
//! - [`seed`]: round seed `H(tag ‖ round_id ‖ external_seed)`.
//! - [`chain`]: the draw chain `v_{n+1} = H(v_n)` and draws reduced from it.
//! - [`reduce`]: exact reduction of a 256-bit big-endian value modulo a `u128`.
//!
//! The chain construction is a plain hash chain, not a formally analysed VRF.

pub mod chain;
pub mod error;
pub mod reduce;
pub mod seed;

pub use chain::DrawChain;
pub use error::VrfError;
pub use reduce::reduce_be_mod;
pub use seed::derive_round_seed;

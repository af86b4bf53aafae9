//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the engine (wall clock, chain gateway,
//! oracle keys) has an in-memory stand-in here that:
//! - returns deterministic values
//! - can be steered programmatically (advance time, fail the gateway)
//! - never touches the network
//!
//! The daemon's `simulate` command runs against these as well.

pub mod clock;
pub mod gateway;
pub mod oracle;

pub use clock::NullClock;
pub use gateway::{AnchoredResult, NullGateway};
pub use oracle::{test_pool, TestOracle};

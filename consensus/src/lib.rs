//! Consensus rounds.
//!
//! A round collects signed reports (a 32-byte data hash each) from the pool
//! or from a freshly selected committee, weights every report by the
//! oracle's stake-and-reputation weight, and finalizes once a single hash
//! holds at least the threshold fraction of the round's total weight, or
//! when its window closes.
//!
//! - [`submission`]: the signed message and submission record.
//! - [`tally`]: weight per distinct hash and the deterministic leader.
//! - [`round`]: one round's `Open -> Finalized` state machine.
//! - [`result`]: the immutable `ConsensusResult`.
//! - [`manager`]: all rounds of a node, committee selection and events.
//! - [`events`]: lifecycle events and the listener bus.

pub mod error;
pub mod events;
pub mod manager;
pub mod result;
pub mod round;
pub mod submission;
pub mod tally;

pub use error::ConsensusError;
pub use events::{ConsensusEvent, EventBus, EventListener};
pub use manager::{RoundManager, DEFAULT_MAX_OPEN_ROUNDS};
pub use result::{ConsensusResult, FailureReason};
pub use round::{Round, RoundState, SubmitOutcome};
pub use submission::{sign_submission, submission_message, verify_submission, OracleSubmission};
pub use tally::{recompute_tally, Tally};

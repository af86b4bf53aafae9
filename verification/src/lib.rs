//! Third-party verification.
//!
//! Everything here is a pure function of published artefacts: a
//! `CommitteeSelection`, a `ConsensusResult`, a registry snapshot and the
//! consensus parameters. Nothing talks to the gateway or holds state, so an
//! auditor can rerun any check offline.

pub mod error;
pub mod result;
pub mod selection;

pub use error::VerificationError;
pub use guardian_consensus::recompute_tally;
pub use result::{check_submission_weights, verify_result, TallyReport};
pub use selection::{recompute_selection, verify_selection};

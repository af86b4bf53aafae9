//! Committee selection.
//!
//! Picks a per-round committee from the registry's eligible pool. Selection is
//! a pure function of `(round_id, external_seed, snapshot, cooldown state,
//! params)`: the [`CommitteeSelector`] only adds bookkeeping around
//! [`compute_selection`] (cooldown history and a retained selection map), so
//! observers can recompute any selection with the same inputs.
//!
//! - [`sampling`]: weighted sampling without replacement, uniform fallback and top-up.
//! - [`cooldown`]: rotation: who sat on a recent committee.
//! - [`proof`]: the selection proof hash.
//! - [`selection`]: the `CommitteeSelection` record.
//! - [`selector`]: stateful selector, retained history and verification.

pub mod cooldown;
pub mod error;
pub mod proof;
pub mod sampling;
pub mod selection;
pub mod selector;

pub use cooldown::CooldownTracker;
pub use error::{CommitteeError, SelectionFault};
pub use proof::compute_selection_proof;
pub use sampling::sample_committee;
pub use selection::CommitteeSelection;
pub use selector::{check_selection, compute_selection, CommitteeSelector};

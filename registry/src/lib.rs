//! Oracle registry.
//!
//! Holds the pool of oracles eligible for committee selection and vote
//! weighting. The pool is an immutable [`RegistrySnapshot`] behind an `Arc`:
//! a reload or an incremental update builds a new snapshot and swaps it in,
//! so selections and rounds holding an older snapshot keep consistent
//! arithmetic for their whole lifetime.
//!
//! - [`gateway`]: the external state source (chain contract) interface.
//! - [`oracle`]: per-oracle stake, reputation and derived weight.
//! - [`snapshot`]: an eligible-only, address-ordered view of the pool.
//! - [`registry`]: owner of the current snapshot; load and update.

pub mod error;
pub mod gateway;
pub mod oracle;
pub mod registry;
pub mod snapshot;

pub use error::{GatewayError, RegistryError};
pub use gateway::{OracleGateway, OracleStatus};
pub use oracle::{OracleInfo, OracleUpdate};
pub use registry::{fetch_snapshot, OracleRegistry};
pub use snapshot::RegistrySnapshot;

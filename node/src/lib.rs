//! Guardian node: the async runtime around the consensus core.
//!
//! The node:
//! - Keeps the oracle registry fresh, retrying the gateway with backoff
//! - Opens rounds seeded from the latest block hash and arms their windows
//! - Routes signed submissions and anchors agreed results on chain
//! - Exposes Prometheus metrics and structured logs
//! - Drains and force-finalizes open rounds on shutdown

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod shutdown;

pub use config::NodeConfig;
pub use engine::GuardianEngine;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use shutdown::ShutdownController;

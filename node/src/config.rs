//! Node configuration, loaded from TOML.
//!
//! Every field has a serde default, so a config file only needs the keys it
//! changes. Consensus parameters live under a `[params]` table with
//! `[params.committee]` and `[params.round]` sub-tables.

use crate::logging::LogFormat;
use crate::NodeError;
use guardian_consensus::DEFAULT_MAX_OPEN_ROUNDS;
use guardian_types::ConsensusParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_shutdown_grace_secs() -> u64 {
    5
}
fn default_refresh_interval_secs() -> u64 {
    60
}
fn default_refresh_retries() -> u32 {
    3
}
fn default_refresh_backoff_ms() -> u64 {
    500
}
fn default_max_open_rounds() -> usize {
    DEFAULT_MAX_OPEN_ROUNDS
}
fn default_log_format() -> String {
    "human".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// How long `shutdown` waits for open rounds to close on their own before
    /// force-finalizing them. Also bounds the wait for in-flight anchoring.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Period of the background registry refresh and cleanup loop.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Extra attempts after a retryable refresh failure.
    #[serde(default = "default_refresh_retries")]
    pub refresh_retries: u32,

    /// First retry delay; doubled on every further attempt.
    #[serde(default = "default_refresh_backoff_ms")]
    pub refresh_backoff_ms: u64,

    #[serde(default = "default_max_open_rounds")]
    pub max_open_rounds: usize,

    /// "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub params: ConsensusParams,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_retries: default_refresh_retries(),
            refresh_backoff_ms: default_refresh_backoff_ms(),
            max_open_rounds: default_max_open_rounds(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            params: ConsensusParams::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check everything an engine relies on before it is built.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.params
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        self.log_format()?;
        if self.max_open_rounds == 0 {
            return Err(NodeError::Config("max_open_rounds must be at least 1".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(NodeError::Config("refresh_interval_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn refresh_backoff(&self) -> Duration {
        Duration::from_millis(self.refresh_backoff_ms)
    }
}

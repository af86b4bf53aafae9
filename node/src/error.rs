use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("registry error: {0}")]
    Registry(#[from] guardian_registry::RegistryError),

    #[error("gateway error: {0}")]
    Gateway(#[from] guardian_registry::GatewayError),

    #[error("consensus error: {0}")]
    Consensus(#[from] guardian_consensus::ConsensusError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// The consensus error inside, if any.
    pub fn as_consensus(&self) -> Option<&guardian_consensus::ConsensusError> {
        match self {
            NodeError::Consensus(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for NodeError {
    fn from(e: tokio::task::JoinError) -> Self {
        NodeError::Task(e.to_string())
    }
}

use thiserror::Error;

use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to persist snapshot: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("a refresh is already running")]
    AlreadyRunning,

    #[error("refresh did not finish within {0} seconds")]
    Timeout(u64),
}

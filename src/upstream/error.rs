use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    #[error("upstream rejected request with status {status}")]
    Rejected { status: u16 },

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

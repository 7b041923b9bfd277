use reqwest;
use thiserror::Error;

/// Failures of the registry HTTP client.
///
/// Expected registry statuses (200/404/409) are never errors; they are
/// returned as data so the link layer can map them. Only transport problems
/// and undecodable bodies surface here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry response body could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

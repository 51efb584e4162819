/// Failures at the boundaries of the map subsystem. None of them is fatal: callers log them
/// and keep the last known good state on screen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// A snapshot or response body could not be decoded.
    #[error("could not parse feature collection: {0}")]
    Parse(String),
    /// Transport failure, timeout or non-success status.
    #[error("network request failed: {0}")]
    Network(String),
    /// The durable snapshot slot could not be read or written.
    #[error("snapshot storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for MapError {
    fn from(err: reqwest::Error) -> Self {
        MapError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Storage(err.to_string())
    }
}

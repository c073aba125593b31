use std::path::PathBuf;

/// Errors raised while preparing or performing an import run.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    /// The request never produced an HTTP response.
    #[error("Request to {url} failed: {detail}")]
    Unreachable { url: String, detail: String },

    /// A response arrived with a status the step does not accept.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A response body was not the JSON the step expects.
    #[error("Malformed response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: String, detail: String },

    /// Site password or account bootstrap refused.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Errors raised while loading import settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A key is present but its value cannot be used.
    #[error("Invalid value for '{key}': {detail}")]
    InvalidValue { key: String, detail: String },
}

use thiserror::Error;

/// Errors returned by CivitAI operations.
#[derive(Error, Debug)]
pub enum CivitaiError {
    /// The API returned a non-success HTTP status.
    #[error("CivitAI returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected data.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CivitaiError>;

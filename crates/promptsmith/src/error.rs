use thiserror::Error;

/// Errors from the remote enhancement path.
///
/// [`crate::Enhancer::enhance`] converts every variant into the
/// deterministic local fallback; they are exposed for callers using
/// [`crate::Enhancer::try_enhance`] directly.
#[derive(Error, Debug)]
pub enum EnhanceError {
    /// The text-generation server returned a non-success HTTP status.
    #[error("text-generation server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The response text could not be parsed into an enhancement.
    #[error("could not parse enhancement from model output: {0}")]
    Unparseable(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EnhanceError>;

use thiserror::Error;

/// Errors returned by hosted generation APIs.
#[derive(Error, Debug)]
pub enum CloudError {
    /// The provider returned a non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// The provider reported the request as failed.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// Timed out waiting for the queued request to complete.
    #[error("generation timed out")]
    Timeout,

    /// Retries exhausted while the hosted model was still loading.
    #[error("model still loading after {attempts} attempts")]
    ModelLoading { attempts: u32 },

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
pub type Result<T> = std::result::Result<T, CloudError>;

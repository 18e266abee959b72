use thiserror::Error;

/// Errors returned by graph construction and render-server operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The server returned a non-success HTTP status.
    #[error("render server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response from the server was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// The submitted graph had node-level errors.
    #[error("graph node errors: {0}")]
    NodeErrors(String),

    /// A node input references a node id that is not in the graph.
    #[error("node {node} input {input:?} references missing node {target:?}")]
    DanglingReference {
        node: String,
        input: String,
        target: String,
    },

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
pub type Result<T> = std::result::Result<T, RenderError>;

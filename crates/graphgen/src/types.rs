use serde::{Deserialize, Serialize};

/// Reference to an image stored in the render server's output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    pub subfolder: String,
    pub img_type: String,
}

/// Parsed history entry for a submitted job.
#[derive(Debug, Clone)]
pub struct JobHistory {
    pub status: String,
    pub completed: bool,
    pub images: Vec<ImageRef>,
}

/// Outcome of waiting for a job to finish.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The job completed successfully with output images.
    Completed { images: Vec<ImageRef> },
    /// The server reported an execution-level failure.
    Failed { error: String },
    /// Timed out before completion.
    TimedOut,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

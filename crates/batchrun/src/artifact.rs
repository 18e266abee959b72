//! JSON artifact persistence under a working directory.
//!
//! Constructed graphs, enhancement metadata, and the final run summary
//! are written as pretty-printed JSON for later inspection. These files
//! are a side channel, never a control input.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::types::RunSummary;

/// Filename of the run log written by [`RunSummary::write`].
pub const RUN_LOG_FILENAME: &str = "generation_log.json";

/// Write `value` as pretty JSON to `dir/filename`, creating the
/// directory if needed. Returns the full path written.
pub fn save_json<T: Serialize>(dir: &Path, filename: &str, value: &T) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating artifact directory {}", dir.display()))?;
    let path = dir.join(filename);
    let json = serde_json::to_string_pretty(value).context("serializing artifact")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

impl RunSummary {
    /// Persist this summary as the run log in `dir`.
    pub fn write(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = save_json(dir, RUN_LOG_FILENAME, self)?;
        info!(path = %path.display(), "run log written");
        Ok(path)
    }
}

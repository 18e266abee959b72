use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading and validating configuration.
///
/// Missing credentials are fatal at startup, before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The secrets file could not be read.
    #[error("cannot read secrets file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: dotenvy::Error,
    },

    /// One or more required keys were absent. The message lists them all
    /// so a single run surfaces every gap.
    #[error("missing required configuration keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

//! # batchrun
//!
//! Batch execution for image-generation jobs: configuration from a
//! dotenv-style secrets file, a bounded-concurrency runner, per-item
//! reports with a persisted JSON run log, and a capped-attempts retry
//! helper.
//!
//! The runner makes the batch scripts' implicit rules explicit:
//!
//! - items are independent: no shared mutable state, no cross-item
//!   ordering guarantees, results recorded in completion order;
//! - a failure is local to its item and never aborts the batch;
//! - at most N items are in flight at once (default 3, the polite rate
//!   limit for hosted APIs);
//! - the run ends with a summary of success/failure counts and timing,
//!   written to `generation_log.json`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use batchrun::{BatchRunner, Config, ItemHandler, ItemResult};
//!
//! struct Printer;
//!
//! impl ItemHandler<String> for Printer {
//!     async fn process(&self, name: &str, prompt: &String) -> anyhow::Result<ItemResult> {
//!         println!("{name}: {prompt}");
//!         Ok(ItemResult::success("job-1"))
//!     }
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! batchrun::init_tracing();
//! let config = Config::load("secrets.env")?;
//! config.require(&[])?;
//!
//! let summary = BatchRunner::new()
//!     .run(Printer, vec![("apple".into(), "a red apple".into())])
//!     .await;
//! summary.write(std::path::Path::new("artifacts"))?;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod retry;
pub mod runner;
pub mod types;

pub use artifact::{save_json, RUN_LOG_FILENAME};
pub use config::Config;
pub use error::ConfigError;
pub use retry::{with_attempts, Backoff};
pub use runner::{BatchRunner, ItemHandler, DEFAULT_CONCURRENCY};
pub use types::{ItemReport, ItemResult, ItemStatus, RunSummary};

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber reading `RUST_LOG`, defaulting
/// to `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

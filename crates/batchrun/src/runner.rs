use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::types::{ItemReport, ItemResult, ItemStatus, RunSummary};

/// Default number of simultaneous in-flight items, matching the rate
/// limit the batch scripts apply to hosted APIs.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Trait for processing individual items in a batch.
///
/// # Example
///
/// ```ignore
/// use batchrun::{ItemHandler, ItemResult};
///
/// struct MyHandler;
///
/// impl ItemHandler<String> for MyHandler {
///     async fn process(&self, name: &str, prompt: &String) -> anyhow::Result<ItemResult> {
///         println!("generating {name}: {prompt}");
///         Ok(ItemResult::success("job-1"))
///     }
/// }
/// ```
pub trait ItemHandler<D>: Send + Sync + 'static
where
    D: Clone + Send + Sync + 'static,
{
    /// Process a single item. Returning `Err` (or an unsuccessful
    /// [`ItemResult`]) marks the item failed; the batch continues.
    fn process(
        &self,
        name: &str,
        item: &D,
    ) -> impl std::future::Future<Output = anyhow::Result<ItemResult>> + Send;
}

/// Runs a set of independent items through a handler behind a bounded
/// concurrency gate.
///
/// Each item is independent: there is no shared mutable state between
/// them, no cross-item ordering guarantee, and a failure never aborts
/// the batch. Reports are appended in completion order.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    concurrency: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRunner {
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the number of simultaneous in-flight items (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every `(name, item)` pair through the handler and aggregate
    /// the per-item reports into a [`RunSummary`].
    pub async fn run<D, H>(&self, handler: H, items: Vec<(String, D)>) -> RunSummary
    where
        D: Clone + Send + Sync + 'static,
        H: ItemHandler<D>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = items.len();
        let handler = Arc::new(handler);
        let gate = Arc::new(Semaphore::new(self.concurrency));

        let mut tasks = JoinSet::new();
        for (name, item) in items {
            let handler = Arc::clone(&handler);
            let gate = Arc::clone(&gate);
            tasks.spawn(async move {
                // The gate lives for the whole run and is never closed,
                // but a closed semaphore must not look like a success.
                let Ok(_permit) = gate.acquire_owned().await else {
                    return ItemReport {
                        name,
                        status: ItemStatus::Failed,
                        job_id: None,
                        error: Some("concurrency gate closed".to_string()),
                        duration_ms: 0,
                        timestamp: Utc::now(),
                    };
                };
                let item_start = Instant::now();
                let outcome = handler.process(&name, &item).await;
                let duration_ms = item_start.elapsed().as_millis() as u64;

                let (status, job_id, error) = match outcome {
                    Ok(ItemResult {
                        success: true,
                        job_id,
                        ..
                    }) => (ItemStatus::Completed, job_id, None),
                    Ok(ItemResult { job_id, error, .. }) => (
                        ItemStatus::Failed,
                        job_id,
                        error.or_else(|| Some("unknown error".to_string())),
                    ),
                    Err(e) => (ItemStatus::Failed, None, Some(format!("{:#}", e))),
                };

                ItemReport {
                    name,
                    status,
                    job_id,
                    error,
                    duration_ms,
                    timestamp: Utc::now(),
                }
            });
        }

        let mut reports = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    match report.status {
                        ItemStatus::Completed => info!(
                            name = %report.name,
                            done = reports.len() + 1,
                            total,
                            duration_ms = report.duration_ms,
                            "item completed"
                        ),
                        ItemStatus::Failed => warn!(
                            name = %report.name,
                            done = reports.len() + 1,
                            total,
                            error = report.error.as_deref().unwrap_or("unknown"),
                            "item failed"
                        ),
                    }
                    reports.push(report);
                }
                Err(e) => warn!(error = %e, "batch task aborted"),
            }
        }

        let summary = RunSummary::new(started_at, start.elapsed().as_millis() as u64, reports);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed_ms,
            "batch finished"
        );
        summary
    }
}

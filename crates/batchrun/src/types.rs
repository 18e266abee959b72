use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final status of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Completed,
    Failed,
}

/// What a handler reports back for one processed item.
#[derive(Debug, Clone, Default)]
pub struct ItemResult {
    pub success: bool,
    pub job_id: Option<String>,
    pub error: Option<String>,
}

impl ItemResult {
    pub fn success(job_id: impl Into<String>) -> Self {
        Self {
            success: true,
            job_id: Some(job_id.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Per-item record persisted in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub name: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated result of a batch run: counts, timing, and every item's
/// report in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub reports: Vec<ItemReport>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, elapsed_ms: u64, reports: Vec<ItemReport>) -> Self {
        let succeeded = reports
            .iter()
            .filter(|r| r.status == ItemStatus::Completed)
            .count();
        Self {
            started_at,
            total: reports.len(),
            succeeded,
            failed: reports.len() - succeeded,
            elapsed_ms,
            reports,
        }
    }

    /// Average wall time per successful item, if any succeeded.
    pub fn avg_ms_per_success(&self) -> Option<u64> {
        if self.succeeded == 0 {
            None
        } else {
            Some(self.elapsed_ms / self.succeeded as u64)
        }
    }
}

//! Job state for asynchronously executed batch operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of bulk operation a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    BulkCheckpoint,
    BulkEmail,
    BulkTicketGen,
}

/// Job lifecycle status.
///
/// `queued -> running -> {completed | failed | cancelled}`; the three
/// terminal states are never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Outcome of a single work item within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Success,
    Skipped,
    Error,
}

/// Aggregate item counters for a job.
///
/// Invariant: the three counters always sum to the job's `progress`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMeta {
    pub success_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
}

impl JobMeta {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Success => self.success_count += 1,
            ItemOutcome::Skipped => self.skipped_count += 1,
            ItemOutcome::Error => self.error_count += 1,
        }
    }

    /// Total items accounted for across all three counters.
    pub fn processed(&self) -> u64 {
        self.success_count + self.error_count + self.skipped_count
    }
}

/// A batch operation with trackable progress and cooperative cancellation.
///
/// Retained in memory for the lifetime of the process; there is no
/// persistence requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub total: u64,
    /// Items processed so far; monotonically non-decreasing, never above
    /// `total`.
    pub progress: u64,
    pub meta: JobMeta,
    pub cancel_requested: bool,
    /// Failure message, set only when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: JobType, total: usize) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type,
            status: JobStatus::Queued,
            total: total as u64,
            progress: 0,
            meta: JobMeta::default(),
            cancel_requested: false,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the last-update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_queued() {
        let job = Job::new(JobType::BulkCheckpoint, 10);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.total, 10);
        assert_eq!(job.progress, 0);
        assert!(!job.cancel_requested);
        assert_eq!(job.meta.processed(), 0);
    }

    #[test]
    fn meta_counters_sum_to_processed() {
        let mut meta = JobMeta::default();
        meta.record(ItemOutcome::Success);
        meta.record(ItemOutcome::Success);
        meta.record(ItemOutcome::Skipped);
        meta.record(ItemOutcome::Error);
        assert_eq!(meta.success_count, 2);
        assert_eq!(meta.skipped_count, 1);
        assert_eq!(meta.error_count, 1);
        assert_eq!(meta.processed(), 4);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn job_serializes_camel_case() {
        let job = Job::new(JobType::BulkEmail, 3);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobType"], "bulk_email");
        assert!(value["meta"]["successCount"].is_u64());
        assert!(value.get("error").is_none());
    }
}

//! Bulk checkpoint mark/unmark adapter.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{CheckpointKind, ItemOutcome, JobType, ScanMethod};
use crate::jobs::{ItemHandler, JobEngine};
use crate::store::AttendeeDirectory;

/// Whether the batch marks or clears the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointAction {
    Mark,
    Unmark,
}

/// One bulk checkpoint request from the admin UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckpointRequest {
    /// Attendee ids to process, one work item each.
    pub attendee_refs: Vec<String>,
    pub action: CheckpointAction,
    pub checkpoint_type: CheckpointKind,
    #[serde(default = "default_method")]
    pub scan_method: ScanMethod,
}

fn default_method() -> ScanMethod {
    ScanMethod::Manual
}

struct CheckpointBatchHandler {
    directory: Arc<dyn AttendeeDirectory>,
    event_id: String,
    action: CheckpointAction,
    kind: CheckpointKind,
    method: ScanMethod,
}

#[async_trait]
impl ItemHandler for CheckpointBatchHandler {
    type Item = String;

    async fn handle(&self, attendee_id: String) -> ItemOutcome {
        match self.action {
            CheckpointAction::Mark => {
                match self
                    .directory
                    .mark(&self.event_id, &attendee_id, self.kind, self.method)
                    .await
                {
                    Ok(result) if result.already_scanned => ItemOutcome::Skipped,
                    Ok(_) => ItemOutcome::Success,
                    Err(e) => {
                        warn!(
                            event_id = %self.event_id,
                            attendee_id = %attendee_id,
                            error = %e,
                            "Bulk mark failed for item"
                        );
                        ItemOutcome::Error
                    }
                }
            }
            CheckpointAction::Unmark => {
                match self
                    .directory
                    .unmark(&self.event_id, &attendee_id, self.kind)
                    .await
                {
                    // Clearing a slot that was never scanned changes nothing.
                    Ok(result) if !result.was_scanned => ItemOutcome::Skipped,
                    Ok(_) => ItemOutcome::Success,
                    Err(e) => {
                        warn!(
                            event_id = %self.event_id,
                            attendee_id = %attendee_id,
                            error = %e,
                            "Bulk unmark failed for item"
                        );
                        ItemOutcome::Error
                    }
                }
            }
        }
    }
}

/// Submit a bulk checkpoint job. Returns the job id immediately.
pub fn submit_bulk_checkpoint(
    engine: &JobEngine,
    directory: Arc<dyn AttendeeDirectory>,
    event_id: &str,
    request: BulkCheckpointRequest,
) -> String {
    let handler = CheckpointBatchHandler {
        directory,
        event_id: event_id.to_string(),
        action: request.action,
        kind: request.checkpoint_type,
        method: request.scan_method,
    };
    engine.submit(JobType::BulkCheckpoint, request.attendee_refs, handler)
}

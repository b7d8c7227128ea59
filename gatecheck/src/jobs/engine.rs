//! Generic async job executor.
//!
//! Accepts a typed list of work items and a handler, runs them on a
//! separate task, tracks aggregate progress and outcomes in the injected
//! job store, and supports cooperative cancellation observed at item
//! boundaries.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::{ItemOutcome, Job, JobStatus, JobType};
use crate::jobs::progress::ProgressBroadcaster;
use crate::jobs::registry::JobStore;
use crate::{Error, Result};

/// Processes one work item of a bulk job.
///
/// Handlers report per-item failures as [`ItemOutcome::Error`]; that is
/// the partial-failure policy and never aborts the batch. A panicking
/// handler is the engine-fault path and fails the whole job.
#[async_trait]
pub trait ItemHandler: Send + Sync + 'static {
    type Item: Send + 'static;

    async fn handle(&self, item: Self::Item) -> ItemOutcome;
}

/// The job execution engine.
///
/// Cheap to clone; all clones share the same registry, broadcaster and
/// cancellation tokens.
#[derive(Clone)]
pub struct JobEngine {
    store: Arc<dyn JobStore>,
    broadcaster: Arc<ProgressBroadcaster>,
    cancel_tokens: Arc<DashMap<String, CancellationToken>>,
}

impl JobEngine {
    pub fn new(store: Arc<dyn JobStore>, broadcaster: Arc<ProgressBroadcaster>) -> Self {
        Self {
            store,
            broadcaster,
            cancel_tokens: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Arc<ProgressBroadcaster> {
        &self.broadcaster
    }

    /// Submit a batch for asynchronous execution and return its job id
    /// immediately.
    ///
    /// An empty batch completes on the spot with `total = 0`.
    pub fn submit<H>(&self, job_type: JobType, items: Vec<H::Item>, handler: H) -> String
    where
        H: ItemHandler,
    {
        let job = Job::new(job_type, items.len());
        let job_id = job.id.clone();
        self.store.insert(job.clone());
        self.broadcaster.publish(&job);
        info!(job_id = %job_id, job_type = ?job_type, total = job.total, "Job submitted");

        if items.is_empty() {
            if let Some(snapshot) = self.store.update(&job_id, &mut |job| {
                job.status = JobStatus::Completed;
                job.touch();
            }) {
                self.broadcaster.publish(&snapshot);
            }
            return job_id;
        }

        let token = CancellationToken::new();
        self.cancel_tokens.insert(job_id.clone(), token.clone());

        let engine = self.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            engine.run(id, items, handler, token).await;
        });

        job_id
    }

    /// Request cancellation of a job.
    ///
    /// Cancelling a job that already reached a terminal state is a
    /// successful no-op, not an error. Unknown ids are `NotFound`.
    pub fn cancel(&self, job_id: &str) -> Result<bool> {
        let job = self
            .store
            .get(job_id)
            .ok_or_else(|| Error::not_found("job", job_id))?;
        if job.status.is_terminal() {
            return Ok(true);
        }

        if let Some(snapshot) = self.store.update(job_id, &mut |job| {
            job.cancel_requested = true;
            job.touch();
        }) {
            self.broadcaster.publish(&snapshot);
        }
        if let Some(token) = self.cancel_tokens.get(job_id) {
            token.cancel();
        }
        info!(job_id = %job_id, "Job cancellation requested");
        Ok(true)
    }

    /// Current snapshot of a job, if known.
    pub fn get_status(&self, job_id: &str) -> Option<Job> {
        self.store.get(job_id)
    }

    /// All known jobs, newest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.store.list()
    }

    async fn run<H>(&self, job_id: String, items: Vec<H::Item>, handler: H, token: CancellationToken)
    where
        H: ItemHandler,
    {
        if let Some(snapshot) = self.store.update(&job_id, &mut |job| {
            job.status = JobStatus::Running;
            job.touch();
        }) {
            self.broadcaster.publish(&snapshot);
        }

        for item in items {
            // Cancellation is observed at item boundaries only; an
            // in-flight item always runs to completion.
            if token.is_cancelled() {
                self.finish(&job_id, JobStatus::Cancelled, None);
                return;
            }

            let outcome = match AssertUnwindSafe(handler.handle(item)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic);
                    error!(job_id = %job_id, message = %message, "Job handler panicked");
                    self.finish(&job_id, JobStatus::Failed, Some(message));
                    return;
                }
            };

            if let Some(snapshot) = self.store.update(&job_id, &mut |job| {
                job.progress += 1;
                job.meta.record(outcome);
                job.touch();
            }) {
                self.broadcaster.publish(&snapshot);
            }
        }

        // A cancel that lands after the last item is still honored.
        if token.is_cancelled() {
            self.finish(&job_id, JobStatus::Cancelled, None);
        } else {
            self.finish(&job_id, JobStatus::Completed, None);
        }
    }

    fn finish(&self, job_id: &str, status: JobStatus, error: Option<String>) {
        if let Some(snapshot) = self.store.update(job_id, &mut |job| {
            job.status = status;
            job.error = error.clone();
            job.touch();
        }) {
            info!(
                job_id = %job_id,
                status = ?snapshot.status,
                progress = snapshot.progress,
                success = snapshot.meta.success_count,
                errors = snapshot.meta.error_count,
                skipped = snapshot.meta.skipped_count,
                "Job finished"
            );
            self.broadcaster.publish(&snapshot);
        } else {
            warn!(job_id = %job_id, "Finished job missing from registry");
        }
        self.cancel_tokens.remove(job_id);
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "job handler panicked".to_string()
    }
}

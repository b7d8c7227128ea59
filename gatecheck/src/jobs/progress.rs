//! Per-job publish/subscribe progress channel.
//!
//! Single-writer/multi-reader: the engine execution publishes snapshots,
//! any number of viewers subscribe. A feed ends once it has delivered a
//! terminal snapshot; late subscribers receive exactly the final snapshot.
//! Publishing never blocks the engine, and subscribers that disconnect do
//! not affect job execution.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{Job, JobStatus};
use crate::jobs::registry::JobStore;

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of job snapshots keyed by job id.
pub struct ProgressBroadcaster {
    store: Arc<dyn JobStore>,
    channels: DashMap<String, broadcast::Sender<Job>>,
}

impl ProgressBroadcaster {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            channels: DashMap::new(),
        }
    }

    /// Push a snapshot to every active subscriber of this job.
    ///
    /// After a terminal snapshot the channel is torn down; later
    /// subscribers take the final-snapshot path instead.
    pub fn publish(&self, job: &Job) {
        if let Some(tx) = self.channels.get(&job.id) {
            // Send errors just mean nobody is watching.
            let _ = tx.send(job.clone());
        }
        if job.status.is_terminal() {
            self.channels.remove(&job.id);
            debug!(job_id = %job.id, status = ?job.status, "Progress channel closed");
        }
    }

    /// Subscribe to a job's snapshot feed. Returns `None` for unknown ids.
    pub fn subscribe(&self, job_id: &str) -> Option<JobFeed> {
        let job = self.store.get(job_id)?;
        if job.status.is_terminal() {
            return Some(JobFeed::terminal(job));
        }

        let rx = self
            .channels
            .entry(job_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        // Re-read after subscribing so no update slips between the lookup
        // and the subscription; duplicates are deduped by the feed.
        let current = self.store.get(job_id)?;
        Some(JobFeed::live(current, rx, self.store.clone(), job_id))
    }
}

/// A subscriber's view of one job's snapshot stream.
pub struct JobFeed {
    job_id: String,
    store: Option<Arc<dyn JobStore>>,
    initial: Option<Job>,
    rx: Option<broadcast::Receiver<Job>>,
    last_delivered: Option<(JobStatus, u64, bool)>,
    done: bool,
}

fn feed_key(job: &Job) -> (JobStatus, u64, bool) {
    (job.status, job.progress, job.cancel_requested)
}

impl JobFeed {
    fn terminal(job: Job) -> Self {
        Self {
            job_id: job.id.clone(),
            store: None,
            initial: Some(job),
            rx: None,
            last_delivered: None,
            done: false,
        }
    }

    fn live(
        current: Job,
        rx: broadcast::Receiver<Job>,
        store: Arc<dyn JobStore>,
        job_id: &str,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            store: Some(store),
            initial: Some(current),
            rx: Some(rx),
            last_delivered: None,
            done: false,
        }
    }

    fn deliver(&mut self, job: Job) -> Option<Job> {
        if job.status.is_terminal() {
            self.done = true;
        }
        self.last_delivered = Some(feed_key(&job));
        Some(job)
    }

    /// Next snapshot, or `None` once a terminal snapshot has been
    /// delivered.
    pub async fn next(&mut self) -> Option<Job> {
        if self.done {
            return None;
        }
        if let Some(job) = self.initial.take() {
            return self.deliver(job);
        }

        loop {
            let rx = self.rx.as_mut()?;
            match rx.recv().await {
                Ok(job) => {
                    if self.last_delivered == Some(feed_key(&job)) {
                        continue;
                    }
                    return self.deliver(job);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Slow consumer: resync from the registry rather than
                    // replaying the backlog.
                    debug!(job_id = %self.job_id, skipped, "Feed lagged; resyncing");
                    let job = self.store.as_ref()?.get(&self.job_id)?;
                    if self.last_delivered == Some(feed_key(&job)) {
                        continue;
                    }
                    return self.deliver(job);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    // The channel was torn down on terminal publish; make
                    // sure this subscriber still sees the final snapshot.
                    let job = self.store.as_ref()?.get(&self.job_id)?;
                    if job.status.is_terminal() && self.last_delivered != Some(feed_key(&job)) {
                        return self.deliver(job);
                    }
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

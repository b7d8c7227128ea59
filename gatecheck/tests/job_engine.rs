//! End-to-end tests for the job engine and its progress feeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use gatecheck::domain::{ItemOutcome, Job, JobStatus, JobType};
use gatecheck::jobs::{InMemoryJobStore, ItemHandler, JobEngine, JobStore, ProgressBroadcaster};

fn engine() -> JobEngine {
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let broadcaster = Arc::new(ProgressBroadcaster::new(store.clone()));
    JobEngine::new(store, broadcaster)
}

/// Drain a job's feed until it closes, returning every delivered snapshot.
async fn drain(engine: &JobEngine, job_id: &str) -> Vec<Job> {
    let mut feed = engine
        .broadcaster()
        .subscribe(job_id)
        .expect("job should be known");
    let mut snapshots = Vec::new();
    while let Some(job) = feed.next().await {
        snapshots.push(job);
    }
    snapshots
}

struct SleepyHandler {
    delay: Duration,
    outcome: ItemOutcome,
}

#[async_trait]
impl ItemHandler for SleepyHandler {
    type Item = u32;

    async fn handle(&self, _item: u32) -> ItemOutcome {
        tokio::time::sleep(self.delay).await;
        self.outcome
    }
}

struct EvenItemsFail;

#[async_trait]
impl ItemHandler for EvenItemsFail {
    type Item = u32;

    async fn handle(&self, item: u32) -> ItemOutcome {
        if item % 2 == 0 {
            ItemOutcome::Error
        } else {
            ItemOutcome::Success
        }
    }
}

struct PanicsAt {
    at: u32,
}

#[async_trait]
impl ItemHandler for PanicsAt {
    type Item = u32;

    async fn handle(&self, item: u32) -> ItemOutcome {
        if item == self.at {
            panic!("boom on item {item}");
        }
        ItemOutcome::Success
    }
}

#[tokio::test]
async fn counters_sum_to_progress_in_every_snapshot() {
    let engine = engine();
    let job_id = engine.submit(
        JobType::BulkCheckpoint,
        (0..10).collect(),
        EvenItemsFail,
    );

    let snapshots = drain(&engine, &job_id).await;
    assert!(!snapshots.is_empty());
    for job in &snapshots {
        assert_eq!(job.meta.processed(), job.progress);
        assert!(job.progress <= job.total);
    }

    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.progress, 10);
    assert_eq!(last.meta.success_count, 5);
    assert_eq!(last.meta.error_count, 5);
    assert_eq!(last.meta.skipped_count, 0);
}

#[tokio::test]
async fn empty_submission_completes_immediately() {
    let engine = engine();
    let job_id = engine.submit(
        JobType::BulkEmail,
        Vec::new(),
        SleepyHandler {
            delay: Duration::ZERO,
            outcome: ItemOutcome::Success,
        },
    );

    let job = engine.get_status(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total, 0);
    assert_eq!(job.progress, 0);
}

#[tokio::test]
async fn cancellation_freezes_progress_at_an_item_boundary() {
    let engine = engine();
    let job_id = engine.submit(
        JobType::BulkCheckpoint,
        (0..50).collect(),
        SleepyHandler {
            delay: Duration::from_millis(10),
            outcome: ItemOutcome::Success,
        },
    );

    // Let a handful of items run, then cancel.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(engine.cancel(&job_id).unwrap());

    let snapshots = drain(&engine, &job_id).await;
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Cancelled);
    assert!(last.progress < 50, "cancel must stop before the batch ends");
    assert_eq!(last.meta.processed(), last.progress);

    // Progress is frozen once terminal.
    let frozen = last.progress;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.get_status(&job_id).unwrap().progress, frozen);
}

#[tokio::test]
async fn cancel_after_terminal_is_a_noop() {
    let engine = engine();
    let job_id = engine.submit(
        JobType::BulkCheckpoint,
        vec![1, 2, 3],
        SleepyHandler {
            delay: Duration::ZERO,
            outcome: ItemOutcome::Success,
        },
    );
    let snapshots = drain(&engine, &job_id).await;
    assert_eq!(snapshots.last().unwrap().status, JobStatus::Completed);

    assert!(engine.cancel(&job_id).unwrap());
    let job = engine.get_status(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(!job.cancel_requested);
}

#[tokio::test]
async fn cancel_unknown_job_errors() {
    let engine = engine();
    assert!(engine.cancel("no-such-job").is_err());
}

#[tokio::test]
async fn late_subscriber_gets_exactly_one_final_snapshot() {
    let engine = engine();
    let job_id = engine.submit(
        JobType::BulkEmail,
        vec![1, 2],
        SleepyHandler {
            delay: Duration::ZERO,
            outcome: ItemOutcome::Success,
        },
    );
    // Run to completion before subscribing.
    drain(&engine, &job_id).await;

    let snapshots = drain(&engine, &job_id).await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].status, JobStatus::Completed);
}

#[tokio::test]
async fn handler_panic_fails_the_job() {
    let engine = engine();
    let job_id = engine.submit(JobType::BulkTicketGen, vec![1, 2, 3, 4], PanicsAt { at: 3 });

    let snapshots = drain(&engine, &job_id).await;
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Failed);
    assert_eq!(last.progress, 2, "items before the fault are recorded");
    let error = last.error.as_deref().unwrap();
    assert!(error.contains("boom"), "panic message surfaces: {error}");
}

#[tokio::test]
async fn per_item_errors_never_abort_the_batch() {
    struct Counting {
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl ItemHandler for Counting {
        type Item = u32;

        async fn handle(&self, item: u32) -> ItemOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if item == 0 {
                ItemOutcome::Error
            } else {
                ItemOutcome::Success
            }
        }
    }

    let engine = engine();
    let calls = Arc::new(AtomicU64::new(0));
    let job_id = engine.submit(
        JobType::BulkCheckpoint,
        vec![0, 1, 0, 1, 1],
        Counting {
            calls: calls.clone(),
        },
    );

    let snapshots = drain(&engine, &job_id).await;
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 5, "every item ran");
    assert_eq!(last.meta.error_count, 2);
    assert_eq!(last.meta.success_count, 3);
}

#[tokio::test]
async fn jobs_list_newest_first() {
    let engine = engine();
    let first = engine.submit(
        JobType::BulkCheckpoint,
        Vec::<u32>::new(),
        EvenItemsFail,
    );
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = engine.submit(
        JobType::BulkEmail,
        Vec::<u32>::new(),
        EvenItemsFail,
    );

    let jobs = engine.list_jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, second);
    assert_eq!(jobs[1].id, first);
}

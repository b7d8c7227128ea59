//! Job registry abstraction.
//!
//! An explicit store injected into the engine rather than ambient global
//! state, so a persistent backend can replace the in-memory map without
//! touching call sites.

use dashmap::DashMap;

use crate::domain::Job;

/// Shared job registry: one writer (the owning execution) per job,
/// concurrent readers for status polling.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: Job);

    fn get(&self, id: &str) -> Option<Job>;

    /// Apply a mutation under the entry lock and return the updated
    /// snapshot. A job already in a terminal state is left untouched and
    /// returned as-is: terminal jobs never change again.
    fn update(&self, id: &str, mutate: &mut dyn FnMut(&mut Job)) -> Option<Job>;

    fn list(&self) -> Vec<Job>;
}

/// In-memory job store keyed by job id; jobs live for the process
/// lifetime.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<String, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|job| job.clone())
    }

    fn update(&self, id: &str, mutate: &mut dyn FnMut(&mut Job)) -> Option<Job> {
        let mut entry = self.jobs.get_mut(id)?;
        if !entry.status.is_terminal() {
            mutate(&mut entry);
        }
        Some(entry.clone())
    }

    fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|job| job.clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

//! Generic async job execution: registry, engine and progress feeds.

pub mod engine;
pub mod progress;
pub mod registry;

pub use engine::{ItemHandler, JobEngine};
pub use progress::{JobFeed, ProgressBroadcaster};
pub use registry::{InMemoryJobStore, JobStore};

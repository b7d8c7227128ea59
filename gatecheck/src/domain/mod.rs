//! Core domain model: attendees with checkpoint slots, and jobs.

pub mod attendee;
pub mod job;

pub use attendee::{
    ApprovalStatus, Attendee, CheckpointKind, CheckpointSlot, CheckpointSlots, ScanMethod,
};
pub use job::{ItemOutcome, Job, JobMeta, JobStatus, JobType};

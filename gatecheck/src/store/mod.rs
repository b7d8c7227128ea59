//! Attendee storage and scan-identifier resolution.

pub mod directory;
pub mod resolver;

pub use directory::{
    AttendeeDirectory, CheckpointStats, CheckpointTally, InMemoryDirectory, MarkResult,
    UnmarkResult,
};
pub use resolver::{AttendeeIdentifier, resolve};

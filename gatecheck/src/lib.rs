//! Event check-in backend: attendee roster, checkpoint scanning, bulk
//! jobs with live progress feeds, and ticket image generation.

pub mod api;
pub mod bulk;
pub mod config;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod store;

pub use error::{Error, Result};

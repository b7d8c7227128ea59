//! REST API server module.
//!
//! Provides HTTP endpoints for attendee lookup, checkpoint scanning,
//! bulk operations, and live job progress feeds.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, ApiServerConfig, AppState};

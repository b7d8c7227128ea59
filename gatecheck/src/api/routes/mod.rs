//! API route modules.
//!
//! Organizes routes by resource type.

pub mod attendees;
pub mod checkpoints;
pub mod health;
pub mod jobs;
pub mod notify;
pub mod tickets;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let event_routes = Router::new()
        .merge(attendees::router())
        .merge(checkpoints::router())
        .merge(notify::router())
        .merge(tickets::router());

    Router::new()
        .nest("/api/events/{event}", event_routes)
        .nest("/api/jobs", jobs::router())
        .nest("/health", health::router())
        .with_state(state)
}

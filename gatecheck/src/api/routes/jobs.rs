//! Job status and progress feed routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/jobs` | List jobs, newest first |
//! | GET | `/api/jobs/{id}` | Get a job snapshot |
//! | GET | `/api/jobs/{id}/stream` | Live progress feed (SSE) |
//! | POST | `/api/jobs/{id}/cancel` | Request cancellation |

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::stream::{Stream, unfold};
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::domain::Job;

/// Create the jobs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs))
        .route("/{id}", get(get_job))
        .route("/{id}/stream", get(stream_job))
        .route("/{id}/cancel", post(cancel_job))
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    ok: bool,
}

async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.engine.list_jobs()))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    state
        .engine
        .get_status(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", id)))
}

/// Server-sent progress feed. Emits one `job` event per snapshot and
/// closes after the terminal snapshot; a subscriber joining after the job
/// ended receives the final snapshot once and the stream closes.
async fn stream_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let feed = state
        .broadcaster
        .subscribe(&id)
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", id)))?;

    let stream = unfold(feed, |mut feed| async move {
        let job = feed.next().await?;
        let event = match Event::default().event("job").json_data(&job) {
            Ok(event) => event,
            Err(e) => Event::default().event("error").data(e.to_string()),
        };
        Some((Ok::<_, Infallible>(event), feed))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    let ok = state.engine.cancel(&id)?;
    Ok(Json(CancelResponse { ok }))
}

//! Bulk operation submission routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/events/{event}/checkpoints/bulk` | Submit a bulk mark/unmark job |
//! | POST | `/api/events/{event}/notify` | Submit a bulk email job |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::bulk::{BulkCheckpointRequest, NotifyRequest, submit_bulk_checkpoint, submit_bulk_email};

/// Create the bulk operations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkpoints/bulk", post(bulk_checkpoints))
        .route("/notify", post(bulk_notify))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobSubmittedResponse {
    job_id: String,
    total: usize,
}

async fn bulk_checkpoints(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(request): Json<BulkCheckpointRequest>,
) -> ApiResult<(StatusCode, Json<JobSubmittedResponse>)> {
    if request.attendee_refs.is_empty() {
        return Err(ApiError::validation("attendeeRefs must not be empty"));
    }

    let total = request.attendee_refs.len();
    let job_id = submit_bulk_checkpoint(&state.engine, state.directory.clone(), &event, request);
    Ok((
        StatusCode::ACCEPTED,
        Json(JobSubmittedResponse { job_id, total }),
    ))
}

async fn bulk_notify(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(request): Json<NotifyRequest>,
) -> ApiResult<(StatusCode, Json<JobSubmittedResponse>)> {
    let (job_id, total) = submit_bulk_email(
        &state.engine,
        state.directory.as_ref(),
        state.mailer.clone(),
        &event,
        request,
    )
    .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobSubmittedResponse { job_id, total }),
    ))
}

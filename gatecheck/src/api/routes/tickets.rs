//! Ticket generation routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/events/{event}/tickets/generate` | Submit a bulk ticket render job |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::bulk::{BulkTicketRequest, submit_bulk_ticket_gen};

/// Create the tickets router.
pub fn router() -> Router<AppState> {
    Router::new().route("/tickets/generate", post(generate_tickets))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobSubmittedResponse {
    job_id: String,
    total: usize,
}

/// Queue a render job; output images land under the configured tickets
/// directory, namespaced by event.
async fn generate_tickets(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(request): Json<BulkTicketRequest>,
) -> ApiResult<(StatusCode, Json<JobSubmittedResponse>)> {
    let out_dir = state.config.tickets_dir.join(&event);
    let (job_id, total) = submit_bulk_ticket_gen(
        &state.engine,
        state.directory.as_ref(),
        state.renderer.clone(),
        out_dir,
        &event,
        request,
    )
    .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobSubmittedResponse { job_id, total }),
    ))
}

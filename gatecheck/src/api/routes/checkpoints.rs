//! Checkpoint scan routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/events/{event}/checkpoints/{kind}/scan` | Resolve and mark a checkpoint |
//! | POST | `/api/events/{event}/checkpoints/{kind}/unmark` | Resolve and clear a checkpoint |
//! | GET | `/api/events/{event}/checkpoints/stats` | Per-checkpoint scan statistics |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::domain::{Attendee, CheckpointKind, ScanMethod};
use crate::store::{self, AttendeeIdentifier, CheckpointStats};

/// Create the checkpoints router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkpoints/{kind}/scan", post(scan_checkpoint))
        .route("/checkpoints/{kind}/unmark", post(unmark_checkpoint))
        .route("/checkpoints/stats", get(checkpoint_stats))
}

fn parse_kind(raw: &str) -> Result<CheckpointKind, ApiError> {
    CheckpointKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == raw)
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "unknown checkpoint '{raw}', expected entry, refreshment or swag"
            ))
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanRequest {
    #[serde(flatten)]
    identifier: AttendeeIdentifier,
    #[serde(default = "default_method")]
    scan_method: ScanMethod,
}

fn default_method() -> ScanMethod {
    ScanMethod::Manual
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    already_scanned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendee: Option<Attendee>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnmarkResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    was_scanned: Option<bool>,
}

/// Resolve the identifier and mark the checkpoint slot. A scanner pointed
/// at an unknown code is a normal miss, reported as `found: false`.
async fn scan_checkpoint(
    State(state): State<AppState>,
    Path((event, kind)): Path<(String, String)>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<Json<ScanResponse>> {
    let kind = parse_kind(&kind)?;

    let attendee =
        match store::resolve(state.directory.as_ref(), &event, &request.identifier).await {
            Ok(attendee) => attendee,
            Err(crate::Error::NotFound { .. }) => {
                return Ok(Json(ScanResponse {
                    found: false,
                    already_scanned: None,
                    attendee: None,
                }));
            }
            Err(e) => return Err(e.into()),
        };

    let result = state
        .directory
        .mark(&event, &attendee.id, kind, request.scan_method)
        .await?;
    Ok(Json(ScanResponse {
        found: true,
        already_scanned: Some(result.already_scanned),
        attendee: Some(result.attendee),
    }))
}

async fn unmark_checkpoint(
    State(state): State<AppState>,
    Path((event, kind)): Path<(String, String)>,
    Json(identifier): Json<AttendeeIdentifier>,
) -> ApiResult<Json<UnmarkResponse>> {
    let kind = parse_kind(&kind)?;

    let attendee = match store::resolve(state.directory.as_ref(), &event, &identifier).await {
        Ok(attendee) => attendee,
        Err(crate::Error::NotFound { .. }) => {
            return Ok(Json(UnmarkResponse {
                found: false,
                was_scanned: None,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let result = state.directory.unmark(&event, &attendee.id, kind).await?;
    Ok(Json(UnmarkResponse {
        found: true,
        was_scanned: Some(result.was_scanned),
    }))
}

async fn checkpoint_stats(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> ApiResult<Json<CheckpointStats>> {
    let stats = state.directory.stats(&event).await?;
    Ok(Json(stats))
}

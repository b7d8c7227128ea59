//! Attendee roster routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/events/{event}/attendees` | List attendees, ordered by ticket number |
//! | POST | `/api/events/{event}/attendees` | Register an attendee |
//! | GET | `/api/events/{event}/attendees/{id}` | Get one attendee |
//! | POST | `/api/events/{event}/attendees/resolve` | Resolve a scan identifier |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::domain::{ApprovalStatus, Attendee};
use crate::store::{self, AttendeeIdentifier};

/// Create the attendees router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendees", get(list_attendees).post(create_attendee))
        .route("/attendees/{id}", get(get_attendee))
        .route("/attendees/resolve", post(resolve_attendee))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAttendeeRequest {
    name: String,
    email: String,
    /// Generated (`TKT-XXXXXXXX`) when omitted.
    #[serde(default)]
    ticket_number: Option<String>,
    /// Opaque QR payload; defaults to the ticket number when omitted.
    #[serde(default)]
    qr_payload: Option<String>,
    #[serde(default)]
    approval: Option<ApprovalStatus>,
}

fn generate_ticket_number() -> String {
    use rand::RngExt;
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(8)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("TKT-{suffix}")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendee: Option<Attendee>,
}

async fn list_attendees(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> ApiResult<Json<Vec<Attendee>>> {
    let attendees = state.directory.list(&event).await?;
    Ok(Json(attendees))
}

async fn create_attendee(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(request): Json<CreateAttendeeRequest>,
) -> ApiResult<(StatusCode, Json<Attendee>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let ticket_number = match request.ticket_number {
        Some(ticket_number) if ticket_number.trim().is_empty() => {
            return Err(ApiError::validation("ticketNumber must not be empty"));
        }
        Some(ticket_number) => ticket_number,
        None => generate_ticket_number(),
    };

    let qr_payload = request
        .qr_payload
        .unwrap_or_else(|| ticket_number.clone());
    let mut attendee = Attendee::new(request.name, request.email, ticket_number, qr_payload);
    if let Some(approval) = request.approval {
        attendee = attendee.with_approval(approval);
    }

    let created = state.directory.insert(&event, attendee).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_attendee(
    State(state): State<AppState>,
    Path((event, id)): Path<(String, String)>,
) -> ApiResult<Json<Attendee>> {
    let attendee = state.directory.get(&event, &id).await?;
    Ok(Json(attendee))
}

/// Resolve a scan identifier to an attendee. A miss is a normal outcome
/// for a scanner UI, so it comes back as `found: false` rather than 404.
async fn resolve_attendee(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(identifier): Json<AttendeeIdentifier>,
) -> ApiResult<Json<ResolveResponse>> {
    match store::resolve(state.directory.as_ref(), &event, &identifier).await {
        Ok(attendee) => Ok(Json(ResolveResponse {
            found: true,
            attendee: Some(attendee),
        })),
        Err(crate::Error::NotFound { .. }) => Ok(Json(ResolveResponse {
            found: false,
            attendee: None,
        })),
        Err(e) => Err(e.into()),
    }
}

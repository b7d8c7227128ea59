//! Wire-level tests for the HTTP surface.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use gatecheck::api::{AppState, routes};
use gatecheck::domain::{ItemOutcome, JobType};
use gatecheck::jobs::ItemHandler;

fn app() -> (Router, AppState) {
    let state = AppState::for_tests();
    (routes::create_router(state.clone()), state)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

struct Stalls;

#[async_trait]
impl ItemHandler for Stalls {
    type Item = u32;

    async fn handle(&self, _item: u32) -> ItemOutcome {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        ItemOutcome::Success
    }
}

#[tokio::test]
async fn bulk_checkpoint_submission_is_accepted_at_checkpoints_bulk() {
    let (app, state) = app();

    let attendee = state
        .directory
        .insert(
            "ev1",
            gatecheck::domain::Attendee::new("Ada", "ada@example.com", "TKT-1", "QR-1"),
        )
        .await
        .unwrap();

    let request = post_json(
        "/api/events/ev1/checkpoints/bulk",
        serde_json::json!({
            "attendeeRefs": [attendee.id],
            "action": "mark",
            "checkpointType": "entry"
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = json_body(response).await;
    assert!(body["jobId"].is_string());
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn cancel_responds_with_ok_flag() {
    let (app, state) = app();
    let job_id = state
        .engine
        .submit(JobType::BulkCheckpoint, vec![1, 2, 3], Stalls);

    let response = app
        .oneshot(post_json(
            &format!("/api/jobs/{job_id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn cancel_of_unknown_job_is_404() {
    let (app, _state) = app();
    let response = app
        .oneshot(post_json("/api/jobs/nope/cancel", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_miss_is_found_false_not_404() {
    let (app, _state) = app();
    let response = app
        .oneshot(post_json(
            "/api/events/ev1/checkpoints/entry/scan",
            serde_json::json!({ "ticketNumber": "T404" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["found"], false);
}

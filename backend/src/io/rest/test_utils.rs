//! Helpers for driving the router in handler tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{ApproveTaskResponse, CompletedTask, Kid, SessionResponse, SessionView, Task};
use tower::ServiceExt;

use super::USER_ID_HEADER;
use crate::config::AppConfig;
use crate::domain::test_support::monday;
use crate::domain::FixedClock;
use crate::storage::DbConnection;
use crate::{build_state, create_router};

pub const ADMIN_UID: &str = "admin-uid";
pub const KID_UID: &str = "kid-uid";

/// Router over a fresh in-memory store, pinned to Monday 2024-01-08
pub async fn setup_app() -> Router {
    let db = DbConnection::init_test().await.expect("Failed to create test database");
    let config = AppConfig {
        admin_emails: vec!["admin@example.com".to_string()],
        ..AppConfig::default()
    };
    let state = build_state(Arc::new(db), &config, Arc::new(FixedClock::on(monday())));
    create_router(state, &config)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    uid: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(uid) = uid {
        builder = builder.header(USER_ID_HEADER, uid);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).expect("response body should deserialize")
}

pub async fn sign_in(app: &Router, uid: &str, email: &str) -> SessionResponse {
    let (status, body) = send(
        app,
        "POST",
        "/api/session/sign-in",
        None,
        Some(json!({ "uid": uid, "email": email, "display_name": "Sam" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    parse(&body)
}

/// Sign in the administrator and return the id of their default family
pub async fn admin_family(app: &Router) -> String {
    let session = sign_in(app, ADMIN_UID, "admin@example.com").await;
    match session.view {
        SessionView::ParentDashboard { family_id } => family_id,
        other => panic!("unexpected admin view {:?}", other),
    }
}

/// Create a kid in the family and sign in the account linked to it
pub async fn linked_kid(app: &Router, family_id: &str) -> Kid {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/families/{}/kids", family_id),
        Some(ADMIN_UID),
        Some(json!({ "name": "Mia", "email": "mia@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let kid: Kid = parse(&body);

    let session = sign_in(app, KID_UID, "mia@example.com").await;
    assert_eq!(
        session.view,
        SessionView::KidDashboard { family_id: family_id.to_string(), kid_id: kid.id.clone() }
    );
    kid
}

/// Daily task starting on the test Monday
pub async fn daily_task(app: &Router, family_id: &str, points: u32) -> Task {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/families/{}/tasks", family_id),
        Some(ADMIN_UID),
        Some(json!({
            "name": "Feed the cat",
            "points": points,
            "recurrence_type": "daily",
            "start_date": "2024-01-08"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&body)
}

pub async fn submit(app: &Router, family_id: &str, kid_id: &str, task_id: &str) -> (StatusCode, Vec<u8>) {
    send(
        app,
        "POST",
        &format!("/api/families/{}/completions", family_id),
        Some(KID_UID),
        Some(json!({ "kid_id": kid_id, "task_id": task_id })),
    )
    .await
}

/// Credit `points` to the kid through a submitted and approved task
pub async fn earn_points(app: &Router, family_id: &str, kid_id: &str, points: u32) -> Kid {
    let task = daily_task(app, family_id, points).await;
    let (status, body) = submit(app, family_id, kid_id, &task.id).await;
    assert_eq!(status, StatusCode::CREATED);
    let completed: CompletedTask = parse(&body);

    let (status, body) = send(
        app,
        "POST",
        &format!("/api/families/{}/completions/{}/approve", family_id, completed.id),
        Some(ADMIN_UID),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let approved: ApproveTaskResponse = parse(&body);
    approved.kid
}

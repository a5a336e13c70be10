//! Integration tests for the buzzer API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use buzzer_api::router::build_router;
use buzzer_api::state::AppState;
use buzzer_core::{AdminGate, BuzzerService, StaticCredentials};
use buzzer_ledger::Arbiter;
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_state() -> Arc<AppState> {
    let gate = AdminGate::new(Arc::new(StaticCredentials::with_password(
        "admin", "secret",
    )));
    let service = Arc::new(BuzzerService::new(Arbiter::default(), gate));
    Arc::new(AppState::new(service))
}

fn make_router() -> Router {
    build_router(make_state())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn register(router: &Router, id: &str, name: &str) -> StatusCode {
    let (status, _) = send(
        router,
        post_json("/api/participants", &json!({"id": id, "name": name}), None),
    )
    .await;
    status
}

async fn press(router: &Router, id: &str) -> (StatusCode, Value) {
    send(router, post_json(&format!("/api/participants/{id}/press"), &json!({}), None)).await
}

async fn login(router: &Router) -> String {
    let (status, body) = send(
        router,
        post_json(
            "/api/admin/login",
            &json!({"username": "admin", "password": "secret"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

// =============================================================================
// Participants
// =============================================================================

#[tokio::test]
async fn test_register_and_lookup() {
    let router = make_router();
    assert_eq!(register(&router, "p1", "Alice").await, StatusCode::CREATED);

    let (status, body) = send(&router, get("/api/participants/p1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let router = make_router();
    register(&router, "p1", "Alice").await;
    assert_eq!(register(&router, "p1", "Mallory").await, StatusCode::CONFLICT);

    let (_, body) = send(&router, get("/api/participants/p1", None)).await;
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn test_blank_registration_is_bad_request() {
    let router = make_router();
    assert_eq!(register(&router, "  ", "Alice").await, StatusCode::BAD_REQUEST);
    assert_eq!(register(&router, "p1", "").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_participant_lookup_is_404() {
    let router = make_router();
    let (status, body) = send(&router, get("/api/participants/ghost", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

// =============================================================================
// Presses
// =============================================================================

#[tokio::test]
async fn test_press_then_duplicate() {
    let router = make_router();
    register(&router, "p1", "Alice").await;

    let (status, body) = press(&router, "p1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["participant_id"], "p1");

    let (status, body) = press(&router, "p1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "already_pressed");
}

#[tokio::test]
async fn test_press_unknown_participant() {
    let router = make_router();
    let (status, body) = press(&router, "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "unknown_participant");
}

#[tokio::test]
async fn test_press_status() {
    let router = make_router();
    register(&router, "p1", "Alice").await;

    let (status, body) = send(&router, get("/api/participants/p1/press", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pressed"], false);
    assert!(body["display_time"].is_null());

    press(&router, "p1").await;
    let (_, body) = send(&router, get("/api/participants/p1/press", None)).await;
    assert_eq!(body["pressed"], true);
    assert!(body["display_time"].is_string());
}

#[tokio::test]
async fn test_leaderboard_ranks_by_press_order() {
    let router = make_router();
    register(&router, "p1", "Alice").await;
    register(&router, "p2", "Bob").await;
    press(&router, "p2").await;
    press(&router, "p1").await;

    let (status, body) = send(&router, get("/api/leaderboard", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);
    let board = body["leaderboard"].as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["position"], 1);
    assert_eq!(board[0]["name"], "Bob");
    assert_eq!(board[1]["position"], 2);
    assert_eq!(board[1]["name"], "Alice");
    assert_eq!(body["first"]["name"], "Bob");
}

#[tokio::test]
async fn test_status_counts() {
    let router = make_router();
    register(&router, "p1", "Alice").await;
    register(&router, "p2", "Bob").await;
    press(&router, "p1").await;

    let (_, body) = send(&router, get("/api/status", None)).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["participants"], 2);
    assert_eq!(body["presses"], 1);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let router = make_router();
    let (status, body) = send(
        &router,
        post_json(
            "/api/admin/login",
            &json!({"username": "admin", "password": "wrong"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let router = make_router();
    let (status, _) = send(
        &router,
        post_json("/api/admin/active", &json!({"active": false}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        post_json("/api/admin/reset", &json!({}), Some("not-a-token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, get("/api/admin/presses", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&router, get("/api/status", None)).await;
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn test_disable_blocks_presses_and_reset_reenables() {
    let router = make_router();
    let token = login(&router).await;
    register(&router, "p1", "Alice").await;
    register(&router, "p2", "Bob").await;
    press(&router, "p1").await;

    let (status, _) = send(
        &router,
        post_json("/api/admin/active", &json!({"active": false}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = press(&router, "p2").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["reason"], "buzzer_disabled");

    let (status, _) = send(&router, post_json("/api/admin/reset", &json!({}), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, get("/api/leaderboard", None)).await;
    assert_eq!(body["active"], true);
    assert!(body["leaderboard"].as_array().unwrap().is_empty());
    assert!(body["first"].is_null());

    let (status, _) = press(&router, "p1").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_admin_dumps() {
    let router = make_router();
    let token = login(&router).await;
    register(&router, "p1", "Alice").await;
    register(&router, "p2", "Bob").await;
    press(&router, "p2").await;
    press(&router, "p1").await;

    let (status, body) = send(&router, get("/api/admin/participants", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["p1"], "Alice");
    assert_eq!(body["p2"], "Bob");

    let (status, body) = send(
        &router,
        get("/api/admin/presses?order=insertion", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let presses = body.as_array().unwrap();
    assert_eq!(presses[0]["participant_id"], "p2");
    assert_eq!(presses[0]["sequence"], 1);
    assert_eq!(presses[1]["participant_id"], "p1");
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let router = make_router();
    let token = login(&router).await;

    let (status, _) = send(&router, post_json("/api/admin/logout", &json!({}), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, get("/api/admin/participants", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, post_json("/api/admin/logout", &json!({}), Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutations_are_broadcast() {
    let state = make_state();
    let mut rx = state.subscribe();
    let router = build_router(Arc::clone(&state));

    register(&router, "p1", "Alice").await;
    press(&router, "p1").await;

    let _registered = rx.recv().await.unwrap();
    let pressed = rx.recv().await.unwrap();
    assert_eq!(pressed.leaderboard.len(), 1);
    assert_eq!(pressed.first.map(|f| f.name), Some(String::from("Alice")));
}

//! Axum router construction for the buzzer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{admin, handlers, ws};

/// Build the complete router.
///
/// - `POST /api/participants`, `GET /api/participants/{id}`
/// - `POST|GET /api/participants/{id}/press`
/// - `GET /api/leaderboard`, `GET /api/status`
/// - `POST /api/admin/{login,logout,active,reset}`
/// - `GET /api/admin/{presses,participants}`
/// - `GET /ws/leaderboard`
///
/// CORS allows any origin so a separately hosted front end can call in.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/leaderboard", get(ws::ws_leaderboard))
        // Participants
        .route("/api/participants", post(handlers::register))
        .route("/api/participants/{id}", get(handlers::get_participant))
        .route(
            "/api/participants/{id}/press",
            post(handlers::press).get(handlers::press_status),
        )
        // Public views
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/status", get(handlers::status))
        // Admin
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/active", post(admin::set_active))
        .route("/api/admin/reset", post(admin::reset))
        .route("/api/admin/presses", get(admin::presses))
        .route("/api/admin/participants", get(admin::participants))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

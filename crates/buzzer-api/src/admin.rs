//! Admin REST handlers.
//!
//! `POST /api/admin/login` exchanges credentials for a session token. All
//! other admin routes read the token from `Authorization: Bearer <token>`;
//! a missing or unknown token resolves to an anonymous session and the
//! service answers `401`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/admin/login` | Credentials to token |
//! | `POST` | `/api/admin/logout` | Drop the token |
//! | `POST` | `/api/admin/active` | Enable or disable the buzzer |
//! | `POST` | `/api/admin/reset` | Clear presses and re-enable |
//! | `GET` | `/api/admin/presses` | All presses (`?order=arrival\|insertion`) |
//! | `GET` | `/api/admin/participants` | All participants |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use buzzer_core::{AdminSession, AdminToken};
use buzzer_types::PressOrder;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/admin/login`.
#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
}

/// Response of a successful login.
#[derive(Debug, serde::Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent admin calls.
    pub token: String,
}

/// Body of `POST /api/admin/active`.
#[derive(Debug, serde::Deserialize)]
pub struct SetActiveRequest {
    /// The new buzzer flag.
    pub active: bool,
}

/// Query parameters for `GET /api/admin/presses`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PressesQuery {
    /// Listing order; arrival when omitted.
    pub order: Option<PressOrder>,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct AdminResponse {
    ok: bool,
    message: String,
}

impl AdminResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.to_owned(),
        })
    }
}

/// Extract the bearer token, if present and well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<AdminToken> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .parse()
        .ok()
}

fn session(state: &AppState, headers: &HeaderMap) -> AdminSession {
    state.service.session(bearer_token(headers).as_ref())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Exchange credentials for a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .service
        .admin_login(&body.username, &body.password)
        .ok_or_else(|| ApiError::Unauthorized(String::from("invalid credentials")))?;
    Ok(Json(LoginResponse {
        token: token.to_string(),
    }))
}

/// Drop the caller's session token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized(String::from("missing bearer token")))?;
    if !state.service.admin_logout(&token) {
        return Err(ApiError::Unauthorized(String::from("unknown session")));
    }
    Ok(AdminResponse::ok("Logged out"))
}

// ---------------------------------------------------------------------------
// Buzzer control
// ---------------------------------------------------------------------------

/// Enable or disable the buzzer.
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session(&state, &headers);
    state.service.admin_set_active(&session, body.active).await?;
    state.publish();
    Ok(AdminResponse::ok(if body.active {
        "Buzzer enabled"
    } else {
        "Buzzer disabled"
    }))
}

/// Clear every press and re-enable the buzzer.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = session(&state, &headers);
    state.service.admin_reset(&session).await?;
    state.publish();
    Ok(AdminResponse::ok("Buzzer reset"))
}

// ---------------------------------------------------------------------------
// Dumps
// ---------------------------------------------------------------------------

/// Every press of the round.
pub async fn presses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PressesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session(&state, &headers);
    let presses = state
        .service
        .get_all_presses(&session, query.order.unwrap_or_default())?;
    Ok(Json(presses))
}

/// Every registered participant, keyed by ID.
pub async fn participants(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = session(&state, &headers);
    Ok(Json(state.service.get_all_participants(&session)?))
}

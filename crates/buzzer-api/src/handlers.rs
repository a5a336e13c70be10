//! Participant-facing and public REST handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/participants` | Register a participant |
//! | `GET` | `/api/participants/{id}` | Look up a participant |
//! | `POST` | `/api/participants/{id}/press` | Press the buzzer |
//! | `GET` | `/api/participants/{id}/press` | Own press status |
//! | `GET` | `/api/leaderboard` | Ranked leaderboard + first place |
//! | `GET` | `/api/status` | Buzzer flag and counts |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use buzzer_core::ServiceError;
use buzzer_ledger::PressRejected;
use buzzer_types::ParticipantId;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/participants`.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterRequest {
    /// Externally supplied participant ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Response of `GET /api/participants/{id}/press`.
#[derive(Debug, serde::Serialize)]
pub struct PressStatusResponse {
    /// The participant asked about.
    pub participant_id: ParticipantId,
    /// Whether they have pressed this round.
    pub pressed: bool,
    /// Display time of the press, if any.
    pub display_time: Option<String>,
}

fn participant_id(raw: &str) -> Result<ParticipantId, ApiError> {
    ParticipantId::parse(raw)
        .ok_or_else(|| ApiError::InvalidInput(format!("invalid participant id: {raw:?}")))
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Register a participant. Responds `201 Created` with the stored record.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = state
        .service
        .register_participant(&body.id, &body.name)
        .await?;
    state.publish();
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Look up a registered participant.
pub async fn get_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = participant_id(&id)?;
    state
        .service
        .lookup_participant(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("participant {id}")))
}

// ---------------------------------------------------------------------------
// Presses
// ---------------------------------------------------------------------------

/// Press the buzzer. Responds `201 Created` with the accepted press.
pub async fn press(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = participant_id(&id)?;
    let event = state.service.press(&id).await.inspect_err(|e| {
        debug!(participant = %id, error = %e, "Press not recorded");
    })?;
    state.publish();
    Ok((StatusCode::CREATED, Json(event)))
}

/// Report whether the participant has pressed this round.
///
/// Unregistered participants get `404` so the client can drop a stale
/// identity.
pub async fn press_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = participant_id(&id)?;
    if state.service.lookup_participant(&id).is_none() {
        return Err(ApiError::Service(ServiceError::Rejected(
            PressRejected::UNKNOWN,
        )));
    }
    let display_time = state.service.get_press_status(&id);
    Ok(Json(PressStatusResponse {
        participant_id: id,
        pressed: display_time.is_some(),
        display_time,
    }))
}

// ---------------------------------------------------------------------------
// Public views
// ---------------------------------------------------------------------------

/// The ranked leaderboard, the buzzer flag, and first place.
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.leaderboard_view())
}

/// The buzzer flag plus participant and press counts.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.status())
}

//! HTTP + `WebSocket` API for the quiz buzzer.
//!
//! This crate exposes the [`BuzzerService`](buzzer_core::BuzzerService)
//! over Axum:
//!
//! - **Participant endpoints** for registration, pressing, and own status
//! - **Public views** for the leaderboard and buzzer status
//! - **Admin endpoints** behind a bearer token from `POST /api/admin/login`
//! - **`WebSocket` endpoint** (`/ws/leaderboard`) pushing the leaderboard
//!   after every change via [`tokio::sync::broadcast`]
//!
//! Polling `GET /api/leaderboard` keeps working for clients that cannot
//! hold a socket open.

pub mod admin;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServeError, ServerConfig, start_server};
pub use state::{AppState, LeaderboardBroadcast};

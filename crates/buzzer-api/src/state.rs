//! Shared application state for the buzzer API.
//!
//! [`AppState`] holds the [`BuzzerService`] and the broadcast channel
//! that pushes leaderboard updates to `WebSocket` clients. Every handler
//! that mutates the round calls [`AppState::publish`] afterwards.

use std::sync::Arc;

use buzzer_core::BuzzerService;
use buzzer_ledger::RoundSnapshot;
use buzzer_types::{FirstPlace, LeaderboardEntry};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for leaderboard updates.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest update.
const BROADCAST_CAPACITY: usize = 64;

/// Leaderboard view pushed over the `WebSocket` and served by
/// `GET /api/leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardBroadcast {
    /// Whether presses are currently accepted.
    pub active: bool,
    /// The ranked leaderboard.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// The fastest press, if any.
    pub first: Option<FirstPlace>,
}

impl From<RoundSnapshot> for LeaderboardBroadcast {
    fn from(snapshot: RoundSnapshot) -> Self {
        let first = snapshot.leaderboard.first().map(FirstPlace::from);
        Self {
            active: snapshot.active,
            leaderboard: snapshot.leaderboard,
            first,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The buzzer service for this event.
    pub service: Arc<BuzzerService>,
    /// Broadcast sender for leaderboard updates.
    pub tx: broadcast::Sender<LeaderboardBroadcast>,
}

impl AppState {
    /// Create application state around a service.
    pub fn new(service: Arc<BuzzerService>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { service, tx }
    }

    /// Subscribe to leaderboard updates.
    pub fn subscribe(&self) -> broadcast::Receiver<LeaderboardBroadcast> {
        self.tx.subscribe()
    }

    /// The current leaderboard view, from one consistent read.
    pub fn leaderboard_view(&self) -> LeaderboardBroadcast {
        LeaderboardBroadcast::from(self.service.snapshot())
    }

    /// Push the current leaderboard view to all connected clients.
    ///
    /// Returns the number of receivers. Zero receivers is not an error.
    pub fn publish(&self) -> usize {
        self.tx.send(self.leaderboard_view()).unwrap_or(0)
    }
}

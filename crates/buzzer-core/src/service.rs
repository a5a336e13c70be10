//! The buzzer service: the API the presentation layer calls.
//!
//! [`BuzzerService`] bundles the [`Arbiter`], the [`AdminGate`], and an
//! optional [`Journal`]. Without a journal every operation maps straight
//! onto the arbiter's atomic sections. With a journal, mutations are
//! serialised through a writer gate and follow prepare, persist, commit:
//! memory only changes after the store has accepted the write. A
//! store-side conflict means the store already holds the row; it is loaded
//! back and adopted into memory before the matching domain rejection is
//! reported, so a write whose acknowledgement was lost still counts.
//!
//! # Operations
//!
//! | Operation | Caller |
//! |-----------|--------|
//! | [`register_participant`](BuzzerService::register_participant) | participant |
//! | [`press`](BuzzerService::press) | participant |
//! | [`get_leaderboard`](BuzzerService::get_leaderboard) | anyone |
//! | [`get_press_status`](BuzzerService::get_press_status) | participant |
//! | [`admin_login`](BuzzerService::admin_login) | admin |
//! | [`admin_set_active`](BuzzerService::admin_set_active) | admin |
//! | [`admin_reset`](BuzzerService::admin_reset) | admin |
//! | [`get_all_presses`](BuzzerService::get_all_presses) | admin |
//! | [`get_all_participants`](BuzzerService::get_all_participants) | admin |

use std::collections::BTreeMap;
use std::sync::Arc;

use buzzer_ledger::{Arbiter, NotAuthorized, PressRejected, RegistryError, RoundSnapshot};
use buzzer_types::{
    BuzzerStatus, FirstPlace, LeaderboardEntry, Participant, ParticipantId, PressEvent, PressOrder,
};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::admin::{AdminGate, AdminSession, AdminToken};
use crate::journal::{Journal, JournalError};

/// Errors surfaced to the presentation layer.
///
/// Everything except [`ServiceError::Storage`] is an expected,
/// recoverable condition meant for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A press was not recorded.
    #[error(transparent)]
    Rejected(#[from] PressRejected),

    /// An admin-only operation without admin rights.
    #[error(transparent)]
    NotAuthorized(#[from] NotAuthorized),

    /// The durable store failed. Nothing was changed in memory.
    #[error("storage error: {0}")]
    Storage(String),
}

/// The service facade for one quiz event.
pub struct BuzzerService {
    arbiter: Arbiter,
    gate: AdminGate,
    journal: Option<Arc<dyn Journal>>,
    writer: Mutex<()>,
}

impl core::fmt::Debug for BuzzerService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuzzerService")
            .field("arbiter", &self.arbiter)
            .field("gate", &self.gate)
            .field("journaled", &self.journal.is_some())
            .finish_non_exhaustive()
    }
}

impl BuzzerService {
    /// An in-memory service.
    pub fn new(arbiter: Arbiter, gate: AdminGate) -> Self {
        Self {
            arbiter,
            gate,
            journal: None,
            writer: Mutex::new(()),
        }
    }

    /// A service that writes through to `journal`.
    pub fn with_journal(arbiter: Arbiter, gate: AdminGate, journal: Arc<dyn Journal>) -> Self {
        Self {
            arbiter,
            gate,
            journal: Some(journal),
            writer: Mutex::new(()),
        }
    }

    /// The underlying arbiter.
    pub const fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// The admin gate.
    pub const fn gate(&self) -> &AdminGate {
        &self.gate
    }

    // -----------------------------------------------------------------------
    // Participant operations
    // -----------------------------------------------------------------------

    /// Register a participant.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Registry`] for duplicates and invalid input,
    /// [`ServiceError::Storage`] if the journal fails.
    pub async fn register_participant(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Participant, ServiceError> {
        let Some(journal) = &self.journal else {
            return Ok(self.arbiter.register(id, name)?);
        };

        let _writer = self.writer.lock().await;
        let participant = self.arbiter.check_registration(id, name)?;
        match journal.record_participant(&participant).await {
            Ok(()) => Ok(self.arbiter.commit_registration(&participant)?),
            Err(JournalError::Conflict(constraint)) => {
                self.adopt_stored_participant(journal.as_ref(), &participant.id, &constraint)
                    .await?;
                Err(RegistryError::AlreadyRegistered { id: participant.id }.into())
            }
            Err(JournalError::Storage(msg)) => Err(storage("record_participant", msg)),
        }
    }

    /// Look up a registered participant.
    pub fn lookup_participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.arbiter.lookup(id)
    }

    /// Press the buzzer.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Rejected`] with the highest-priority reason, or
    /// [`ServiceError::Storage`] if the journal fails. A failed press is
    /// never retried here; the participant presses again.
    pub async fn press(&self, participant_id: &ParticipantId) -> Result<PressEvent, ServiceError> {
        let Some(journal) = &self.journal else {
            return Ok(self.arbiter.try_press(participant_id)?);
        };

        let _writer = self.writer.lock().await;
        let prepared = self.arbiter.prepare_press(participant_id)?;
        match journal.record_press(&prepared).await {
            Ok(()) => Ok(self.arbiter.commit_press(prepared)?),
            Err(JournalError::Conflict(constraint)) => {
                self.adopt_stored_press(journal.as_ref(), participant_id, &constraint)
                    .await?;
                Err(PressRejected::DUPLICATE.into())
            }
            Err(JournalError::Storage(msg)) => Err(storage("record_press", msg)),
        }
    }

    async fn adopt_stored_participant(
        &self,
        journal: &dyn Journal,
        id: &ParticipantId,
        constraint: &str,
    ) -> Result<(), ServiceError> {
        let stored = journal
            .load_participant(id)
            .await
            .map_err(|e| storage("load_participant", e.to_string()))?;
        let Some(stored) = stored else {
            warn!(participant = %id, constraint, "Conflict reported but no stored participant found");
            return Ok(());
        };
        self.arbiter.adopt_participant(stored);
        Ok(())
    }

    async fn adopt_stored_press(
        &self,
        journal: &dyn Journal,
        participant_id: &ParticipantId,
        constraint: &str,
    ) -> Result<(), ServiceError> {
        let stored = journal
            .load_press(participant_id)
            .await
            .map_err(|e| storage("load_press", e.to_string()))?;
        let Some(stored) = stored else {
            warn!(participant = %participant_id, constraint, "Conflict reported but no stored press found");
            return Ok(());
        };
        self.arbiter.adopt_press(stored)?;
        Ok(())
    }

    /// Display time of the participant's press this round, if any.
    pub fn get_press_status(&self, participant_id: &ParticipantId) -> Option<String> {
        self.arbiter.press_status(participant_id)
    }

    // -----------------------------------------------------------------------
    // Read views
    // -----------------------------------------------------------------------

    /// The ranked leaderboard.
    pub fn get_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.arbiter.leaderboard()
    }

    /// The fastest press, if any.
    pub fn first_place(&self) -> Option<FirstPlace> {
        self.arbiter.first()
    }

    /// Flag and leaderboard from one consistent read.
    pub fn snapshot(&self) -> RoundSnapshot {
        self.arbiter.snapshot()
    }

    /// Active flag and counts.
    pub fn status(&self) -> BuzzerStatus {
        self.arbiter.status()
    }

    // -----------------------------------------------------------------------
    // Admin operations
    // -----------------------------------------------------------------------

    /// Check admin credentials and open a session on success.
    ///
    /// `admin_login(..).is_some()` is the plain credential check.
    pub fn admin_login(&self, username: &str, password: &str) -> Option<AdminToken> {
        self.gate.login(username, password)
    }

    /// Close an admin session.
    pub fn admin_logout(&self, token: &AdminToken) -> bool {
        self.gate.logout(token)
    }

    /// Resolve a bearer token to a session.
    pub fn session(&self, token: Option<&AdminToken>) -> AdminSession {
        self.gate.session(token)
    }

    /// Enable or disable the buzzer.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotAuthorized`] for non-admin sessions (the state
    /// is unchanged), [`ServiceError::Storage`] if the journal fails.
    pub async fn admin_set_active(
        &self,
        session: &AdminSession,
        active: bool,
    ) -> Result<(), ServiceError> {
        AdminGate::require_admin(session)?;
        if let Some(journal) = &self.journal {
            let _writer = self.writer.lock().await;
            journal
                .record_active(active)
                .await
                .map_err(|e| storage("record_active", e.to_string()))?;
            self.arbiter.set_active(active, session.authenticated)?;
        } else {
            self.arbiter.set_active(active, session.authenticated)?;
        }
        Ok(())
    }

    /// Clear every press and re-activate the buzzer.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotAuthorized`] for non-admin sessions,
    /// [`ServiceError::Storage`] if the journal fails.
    pub async fn admin_reset(&self, session: &AdminSession) -> Result<(), ServiceError> {
        AdminGate::require_admin(session)?;
        if let Some(journal) = &self.journal {
            let _writer = self.writer.lock().await;
            journal
                .record_reset()
                .await
                .map_err(|e| storage("record_reset", e.to_string()))?;
            self.arbiter.reset();
        } else {
            self.arbiter.reset();
        }
        Ok(())
    }

    /// Every press of the round.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotAuthorized`] for non-admin sessions.
    pub fn get_all_presses(
        &self,
        session: &AdminSession,
        order: PressOrder,
    ) -> Result<Vec<PressEvent>, ServiceError> {
        AdminGate::require_admin(session)?;
        Ok(self.arbiter.presses(order))
    }

    /// Every registered participant as an ID-to-name mapping.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotAuthorized`] for non-admin sessions.
    pub fn get_all_participants(
        &self,
        session: &AdminSession,
    ) -> Result<BTreeMap<ParticipantId, String>, ServiceError> {
        AdminGate::require_admin(session)?;
        Ok(self.arbiter.participants())
    }
}

fn storage(operation: &'static str, message: String) -> ServiceError {
    error!(operation, error = %message, "Journal operation failed");
    ServiceError::Storage(message)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use buzzer_types::RejectionReason;

    use super::*;
    use crate::admin::StaticCredentials;
    use crate::journal::{JournalFuture, LoadFuture};

    type Rows<T> = StdMutex<BTreeMap<ParticipantId, T>>;

    /// In-memory journal with unique rows per participant that records
    /// calls and can be told to fail.
    #[derive(Default)]
    struct ScriptedJournal {
        calls: StdMutex<Vec<String>>,
        fail_with: StdMutex<Option<JournalError>>,
        lose_ack: AtomicBool,
        participants: Rows<Participant>,
        presses: Rows<PressEvent>,
    }

    impl ScriptedJournal {
        fn fail_next(&self, err: JournalError) {
            if let Ok(mut slot) = self.fail_with.lock() {
                *slot = Some(err);
            }
        }

        /// The next write is stored but reported as a storage failure.
        fn lose_next_ack(&self) {
            self.lose_ack.store(true, Ordering::SeqCst);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn stored_press(&self, id: &ParticipantId) -> Option<PressEvent> {
            self.presses.lock().ok().and_then(|rows| rows.get(id).cloned())
        }

        fn store<T: Clone>(
            &self,
            call: String,
            rows: &Rows<T>,
            id: &ParticipantId,
            row: &T,
        ) -> JournalFuture<'_> {
            let result = self.scripted().unwrap_or_else(|| {
                let mut rows = rows
                    .lock()
                    .map_err(|e| JournalError::Storage(e.to_string()))?;
                if rows.contains_key(id) {
                    return Err(JournalError::Conflict(String::from("unique_participant")));
                }
                rows.insert(id.clone(), row.clone());
                Ok(())
            });
            self.outcome(call, result)
        }

        fn scripted(&self) -> Option<Result<(), JournalError>> {
            self.fail_with
                .lock()
                .ok()
                .and_then(|mut f| f.take())
                .map(Err)
        }

        fn outcome(&self, call: String, result: Result<(), JournalError>) -> JournalFuture<'_> {
            let result = match result {
                Ok(()) if self.lose_ack.swap(false, Ordering::SeqCst) => {
                    Err(JournalError::Storage(String::from("connection reset")))
                }
                other => other,
            };
            if result.is_ok() {
                if let Ok(mut calls) = self.calls.lock() {
                    calls.push(call);
                }
            }
            Box::pin(async move { result })
        }

        fn load<'a, T: Clone + Send + 'a>(rows: &Rows<T>, id: &ParticipantId) -> LoadFuture<'a, T> {
            let row = rows.lock().ok().and_then(|rows| rows.get(id).cloned());
            Box::pin(async move { Ok(row) })
        }
    }

    impl Journal for ScriptedJournal {
        fn record_participant<'a>(&'a self, participant: &'a Participant) -> JournalFuture<'a> {
            self.store(
                format!("participant:{}", participant.id),
                &self.participants,
                &participant.id,
                participant,
            )
        }

        fn record_press<'a>(&'a self, press: &'a PressEvent) -> JournalFuture<'a> {
            self.store(
                format!("press:{}", press.participant_id),
                &self.presses,
                &press.participant_id,
                press,
            )
        }

        fn record_active(&self, active: bool) -> JournalFuture<'_> {
            let result = self.scripted().unwrap_or(Ok(()));
            self.outcome(format!("active:{active}"), result)
        }

        fn record_reset(&self) -> JournalFuture<'_> {
            let result = self.scripted().unwrap_or(Ok(()));
            if result.is_ok() {
                if let Ok(mut rows) = self.presses.lock() {
                    rows.clear();
                }
            }
            self.outcome(String::from("reset"), result)
        }

        fn load_participant<'a>(&'a self, id: &'a ParticipantId) -> LoadFuture<'a, Participant> {
            Self::load(&self.participants, id)
        }

        fn load_press<'a>(&'a self, participant_id: &'a ParticipantId) -> LoadFuture<'a, PressEvent> {
            Self::load(&self.presses, participant_id)
        }
    }

    fn gate() -> AdminGate {
        AdminGate::new(Arc::new(StaticCredentials::with_password("admin", "pw")))
    }

    fn service() -> BuzzerService {
        BuzzerService::new(Arbiter::default(), gate())
    }

    fn journaled() -> (BuzzerService, Arc<ScriptedJournal>) {
        let journal = Arc::new(ScriptedJournal::default());
        let service = BuzzerService::with_journal(
            Arbiter::default(),
            gate(),
            Arc::clone(&journal) as Arc<dyn Journal>,
        );
        (service, journal)
    }

    fn rejection(result: Result<PressEvent, ServiceError>) -> Option<RejectionReason> {
        match result {
            Err(ServiceError::Rejected(r)) => Some(r.reason),
            _ => None,
        }
    }

    #[tokio::test]
    async fn full_round_in_memory() {
        let service = service();
        assert!(service.register_participant("p1", "Alice").await.is_ok());
        assert!(service.register_participant("p2", "Bob").await.is_ok());

        assert!(service.press(&"p2".into()).await.is_ok());
        assert!(service.press(&"p1".into()).await.is_ok());

        let board = service.get_leaderboard();
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Alice"]);
        assert!(service.get_press_status(&"p1".into()).is_some());
        assert_eq!(
            service.first_place().map(|f| f.name),
            Some(String::from("Bob"))
        );
    }

    #[tokio::test]
    async fn admin_operations_require_a_session() {
        let service = service();
        let anonymous = service.session(None);

        assert_eq!(
            service.admin_set_active(&anonymous, false).await,
            Err(ServiceError::NotAuthorized(NotAuthorized))
        );
        assert!(service.status().active);
        assert!(service.admin_reset(&anonymous).await.is_err());
        assert!(service.get_all_presses(&anonymous, PressOrder::Arrival).is_err());
        assert!(service.get_all_participants(&anonymous).is_err());

        let token = service.admin_login("admin", "pw");
        let session = service.session(token.as_ref());
        assert!(service.admin_set_active(&session, false).await.is_ok());
        assert!(!service.status().active);
        assert!(service.get_all_participants(&session).is_ok());
    }

    #[tokio::test]
    async fn reset_empties_leaderboard_and_reactivates() {
        let service = service();
        let _ = service.register_participant("p1", "Alice").await;
        let _ = service.press(&"p1".into()).await;
        let session = AdminSession::ADMIN;
        let _ = service.admin_set_active(&session, false).await;

        assert!(service.admin_reset(&session).await.is_ok());
        assert!(service.get_leaderboard().is_empty());
        assert!(service.status().active);
    }

    #[tokio::test]
    async fn journal_sees_every_mutation_in_order() {
        let (service, journal) = journaled();
        let admin = AdminSession::ADMIN;

        let _ = service.register_participant("p1", "Alice").await;
        let _ = service.press(&"p1".into()).await;
        let _ = service.admin_set_active(&admin, false).await;
        let _ = service.admin_reset(&admin).await;

        assert_eq!(
            journal.calls(),
            ["participant:p1", "press:p1", "active:false", "reset"]
        );
    }

    #[tokio::test]
    async fn rejected_press_never_reaches_journal() {
        let (service, journal) = journaled();
        assert_eq!(
            rejection(service.press(&"ghost".into()).await),
            Some(RejectionReason::UnknownParticipant)
        );
        assert!(journal.calls().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_leaves_memory_unchanged() {
        let (service, journal) = journaled();
        let _ = service.register_participant("p1", "Alice").await;

        journal.fail_next(JournalError::Storage(String::from("disk full")));
        let result = service.press(&"p1".into()).await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert!(service.get_leaderboard().is_empty());

        // Explicit retry re-runs every check and succeeds.
        assert!(service.press(&"p1".into()).await.is_ok());
        assert_eq!(service.get_leaderboard().len(), 1);
    }

    #[tokio::test]
    async fn press_stored_without_ack_is_adopted_on_retry() {
        let (service, journal) = journaled();
        let _ = service.register_participant("p1", "Alice").await;
        let _ = service.register_participant("p2", "Bob").await;

        journal.lose_next_ack();
        let result = service.press(&"p1".into()).await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert!(service.get_leaderboard().is_empty());

        // The store holds the press, so the retry conflicts and adopts it.
        assert_eq!(
            rejection(service.press(&"p1".into()).await),
            Some(RejectionReason::AlreadyPressed)
        );
        let stored = journal.stored_press(&"p1".into());
        assert!(stored.is_some());
        assert_eq!(
            service.get_press_status(&"p1".into()),
            stored.map(|e| e.display_time)
        );
        assert_eq!(service.status().presses, 1);

        assert_eq!(
            rejection(service.press(&"p1".into()).await),
            Some(RejectionReason::AlreadyPressed)
        );
        assert!(service.press(&"p2".into()).await.is_ok());
        let board = service.get_leaderboard();
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn registration_stored_without_ack_is_adopted_on_retry() {
        let (service, journal) = journaled();

        journal.lose_next_ack();
        assert!(matches!(
            service.register_participant("p2", "Bob").await,
            Err(ServiceError::Storage(_))
        ));
        assert!(service.lookup_participant(&"p2".into()).is_none());

        assert!(matches!(
            service.register_participant("p2", "Robert").await,
            Err(ServiceError::Registry(RegistryError::AlreadyRegistered { .. }))
        ));
        assert_eq!(
            service.lookup_participant(&"p2".into()).map(|p| p.name),
            Some(String::from("Bob"))
        );
        assert!(service.press(&"p2".into()).await.is_ok());
    }

    #[tokio::test]
    async fn store_conflict_maps_to_domain_rejection() {
        let (service, journal) = journaled();
        let _ = service.register_participant("p1", "Alice").await;

        journal.fail_next(JournalError::Conflict(String::from("presses_participant_id_key")));
        assert_eq!(
            rejection(service.press(&"p1".into()).await),
            Some(RejectionReason::AlreadyPressed)
        );

        journal.fail_next(JournalError::Conflict(String::from("participants_pkey")));
        assert!(matches!(
            service.register_participant("p2", "Bob").await,
            Err(ServiceError::Registry(RegistryError::AlreadyRegistered { .. }))
        ));
        assert!(service.lookup_participant(&"p2".into()).is_none());
    }

    #[tokio::test]
    async fn failed_toggle_keeps_previous_state() {
        let (service, journal) = journaled();
        journal.fail_next(JournalError::Storage(String::from("timeout")));
        assert!(
            service
                .admin_set_active(&AdminSession::ADMIN, false)
                .await
                .is_err()
        );
        assert!(service.status().active);
    }

    #[tokio::test]
    async fn concurrent_journaled_presses_are_all_ranked() {
        let (service, _journal) = journaled();
        let service = Arc::new(service);
        for i in 0..20 {
            let _ = service
                .register_participant(&format!("p{i}"), &format!("P{i}"))
                .await;
        }

        let mut handles = Vec::new();
        for i in 0..20 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.press(&ParticipantId::new(format!("p{i}"))).await
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await, Ok(Ok(_))));
        }

        let positions: Vec<u32> = service.get_leaderboard().iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=20).collect::<Vec<u32>>());
    }
}

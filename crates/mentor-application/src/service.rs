//! Tutoring service facade.
//!
//! The seam the host environment talks to: session creation, turn
//! processing under the per-session lock, and read-only derived views.
//! Persistence of session snapshots is a collaborator's concern; the
//! service exposes [`TutorService::snapshot`] for it.

use std::sync::Arc;

use mentor_core::capability::{SafetyGate, TurnDecider};
use mentor_core::config::TutorConfig;
use mentor_core::error::{MentorError, Result};
use mentor_core::session::{Session, SessionMode, Topic, TurnOrchestrator, TurnOutcome};

use crate::factory::{SessionFactory, SessionOptions};
use crate::registry::SessionRegistry;

/// Application service over the turn orchestrator.
pub struct TutorService {
    registry: SessionRegistry,
    orchestrator: TurnOrchestrator,
}

impl TutorService {
    /// Creates a service over the two capability handles.
    pub fn new(
        safety: Arc<dyn SafetyGate>,
        decider: Arc<dyn TurnDecider>,
        config: TutorConfig,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            orchestrator: TurnOrchestrator::new(safety, decider, config),
        }
    }

    /// Creates and registers a new session, returning its id.
    pub async fn create_session(
        &self,
        topic: Topic,
        mode: SessionMode,
        options: SessionOptions,
    ) -> String {
        let session = SessionFactory::create(topic, mode, options);
        let id = session.id.clone();
        tracing::debug!(session_id = %id, mode = %session.mode, "session created");
        self.registry.insert(session).await;
        id
    }

    /// Processes one student message for a session.
    ///
    /// Turns for the same session id are serialized by the session lock;
    /// turns for different sessions proceed independently.
    ///
    /// # Errors
    ///
    /// Returns a NotFound error if the session is not registered.
    pub async fn process_turn(&self, session_id: &str, message: &str) -> Result<TurnOutcome> {
        let handle = self
            .registry
            .get(session_id)
            .await
            .ok_or_else(|| MentorError::not_found("Session", session_id))?;
        let mut session = handle.lock().await;
        Ok(self.orchestrator.process_turn(&mut session, message).await)
    }

    /// Unweighted average mastery for a session.
    pub async fn overall_mastery(&self, session_id: &str) -> Result<f64> {
        self.with_session(session_id, |s| s.overall_mastery()).await
    }

    /// Share of the plan completed, in [0, 100].
    pub async fn progress_percentage(&self, session_id: &str) -> Result<f64> {
        self.with_session(session_id, |s| s.progress_percentage())
            .await
    }

    /// Share of plan concepts at or above the advance threshold, in [0, 100].
    pub async fn coverage_percentage(&self, session_id: &str) -> Result<f64> {
        let threshold = self.orchestrator.config().advance_threshold;
        self.with_session(session_id, |s| s.coverage_percentage(threshold))
            .await
    }

    /// Whether the session has ended.
    pub async fn is_complete(&self, session_id: &str) -> Result<bool> {
        self.with_session(session_id, |s| s.is_complete()).await
    }

    /// A full copy of the session state, for persistence or inspection.
    pub async fn snapshot(&self, session_id: &str) -> Result<Session> {
        self.with_session(session_id, |s| s.clone()).await
    }

    /// Drops a session from the registry.
    pub async fn close_session(&self, session_id: &str) {
        self.registry.remove(session_id).await;
    }

    async fn with_session<T>(
        &self,
        session_id: &str,
        reader: impl FnOnce(&Session) -> T,
    ) -> Result<T> {
        let handle = self
            .registry
            .get(session_id)
            .await
            .ok_or_else(|| MentorError::not_found("Session", session_id))?;
        let session = handle.lock().await;
        Ok(reader(&session))
    }
}

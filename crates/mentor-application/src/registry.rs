//! In-memory session registry.
//!
//! Holds the live `Session` instances and enforces the
//! single-writer-per-session discipline: each session sits behind its own
//! `tokio::sync::Mutex`, so concurrent turns for the same session id are
//! serialized while turns for different sessions run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use mentor_core::session::Session;

/// Registry of live sessions keyed by session id.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl SessionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets the handle for a session by id.
    ///
    /// # Returns
    ///
    /// `Some(handle)` if the session is registered, `None` otherwise.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Registers a session, returning its handle.
    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, handle.clone());
        handle
    }

    /// Removes a session from the registry.
    pub async fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::session::{PlanStep, SessionMode, StepKind, Topic};

    fn session() -> Session {
        Session::new(
            Topic::new(
                "Fractions",
                vec![PlanStep::new(StepKind::Explain, "fractions")],
            ),
            SessionMode::TeachMe,
        )
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let registry = SessionRegistry::new();
        let handle = registry.insert(session()).await;
        let id = handle.lock().await.id.clone();
        assert!(registry.get(&id).await.is_some());
        assert_eq!(registry.len().await, 1);

        registry.remove(&id).await;
        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn same_session_turns_are_serialized() {
        let registry = Arc::new(SessionRegistry::new());
        let handle = registry.insert(session()).await;
        let id = handle.lock().await.id.clone();

        // Two tasks bump the turn counter under the session lock; the
        // final count proves neither update was lost.
        let mut tasks = Vec::new();
        for _ in 0..2 {
            let registry = registry.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let handle = registry.get(&id).await.expect("session registered");
                    let mut session = handle.lock().await;
                    session.turn_count += 1;
                }
            }));
        }
        for task in tasks {
            task.await.expect("task completes");
        }
        assert_eq!(handle.lock().await.turn_count, 100);
    }
}

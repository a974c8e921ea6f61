//! Live debate sessions
//!
//! Sessions live only in memory. Each one sits behind its own async mutex;
//! whoever holds the lock owns the whole read-modify-append of a round, so
//! two submissions for the same debate never interleave. Different debates
//! share nothing.

use moka::future::Cache;
use rebut_core::{DebateId, DebateSession};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SessionStoreConfig;

/// A session plus its per-debate lock
pub type SharedSession = Arc<Mutex<DebateSession>>;

/// Concurrent session map with idle eviction and a capacity bound
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<DebateId, SharedSession>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entries", &self.sessions.entry_count())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionStoreConfig::default())
    }
}

impl SessionStore {
    pub fn new(config: &SessionStoreConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(config.idle_timeout)
            .build();
        Self { sessions }
    }

    /// Register a new session and hand back its lock
    pub async fn create(&self, session: DebateSession) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone()).await;
        shared
    }

    pub async fn get(&self, id: &DebateId) -> Option<SharedSession> {
        self.sessions.get(id).await
    }

    /// Point-in-time copy, waiting for any in-flight round to finish
    pub async fn snapshot(&self, id: &DebateId) -> Option<DebateSession> {
        let shared = self.get(id).await?;
        let session = shared.lock().await;
        Some(session.clone())
    }

    pub async fn remove(&self, id: &DebateId) -> bool {
        self.sessions.remove(id).await.is_some()
    }

    /// Approximate number of live sessions
    pub fn active_count(&self) -> u64 {
        self.sessions.entry_count()
    }
}

//! In-memory session store using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use webs_core::{
    traits::{SessionHandle, SessionStore},
    types::{now_millis, Session, DEFAULT_MAX_HISTORY_TURNS},
    Result,
};

/// In-memory session store.
///
/// The map is sharded, so different sessions never contend; each session's
/// state sits behind its own async mutex.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionHandle>,
    /// History cap applied to newly created sessions.
    max_history_turns: usize,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
        }
    }

    /// Set the history cap for new sessions.
    pub fn with_history_cap(mut self, max_turns: usize) -> Self {
        self.max_history_turns = max_turns;
        self
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: &str) -> Result<SessionHandle> {
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = session_id, "Creating session");
                Arc::new(Mutex::new(
                    Session::new(session_id).with_history_cap(self.max_history_turns),
                ))
            })
            .value()
            .clone();
        Ok(handle)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionHandle>> {
        Ok(self.sessions.get(session_id).map(|r| r.value().clone()))
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    async fn prune(&self, max_idle: Duration) -> Result<usize> {
        let now = now_millis();
        let max_idle_ms = i64::try_from(max_idle.as_millis()).unwrap_or(i64::MAX);
        let before = self.sessions.len();

        // Sessions referenced outside the map or currently locked are in use.
        self.sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => session.idle_millis(now) <= max_idle_ms,
                Err(_) => true,
            }
        });

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed = removed, "Pruned idle sessions");
        }
        Ok(removed)
    }
}

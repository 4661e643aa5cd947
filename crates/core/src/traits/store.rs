//! Session store traits.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::types::{Role, Session};

/// Shared handle to one session's state.
///
/// Holding the lock makes a read-modify-write sequence on the session atomic.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Store of per-session conversation state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the session, creating it on first use.
    async fn get_or_create(&self, session_id: &str) -> Result<SessionHandle>;

    /// Get the session if it exists.
    async fn get(&self, session_id: &str) -> Result<Option<SessionHandle>>;

    /// Remove a session.
    async fn remove(&self, session_id: &str) -> Result<()>;

    /// Number of live sessions.
    fn len(&self) -> usize;

    /// Whether the store holds no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions idle for longer than `max_idle`.
    /// Returns the number of sessions removed.
    async fn prune(&self, max_idle: Duration) -> Result<usize>;

    /// Append one turn to a session's history.
    async fn append_turn(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let handle = self.get_or_create(session_id).await?;
        handle.lock().await.append_turn(role, content);
        Ok(())
    }

    /// Count one served reply, returning the new count.
    async fn increment_usage(&self, session_id: &str) -> Result<u32> {
        let handle = self.get_or_create(session_id).await?;
        let count = handle.lock().await.increment_usage();
        Ok(count)
    }

    /// Whether the session has reached `limit` served replies.
    async fn is_over_limit(&self, session_id: &str, limit: u32) -> Result<bool> {
        let handle = self.get_or_create(session_id).await?;
        let over = handle.lock().await.is_over_limit(limit);
        Ok(over)
    }
}

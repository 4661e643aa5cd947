//! Gateway traits.

use async_trait::async_trait;
use crate::error::Result;
use crate::types::IntentMatch;

/// Classifies messages that ask about the assistant itself.
pub trait IntentMatcher: Send + Sync {
    /// Classify a raw user message.
    fn classify(&self, message: &str) -> IntentMatch;
}

/// Response cache keyed by normalized message text.
///
/// Shared across sessions, so it only ever holds backend replies.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a previously produced reply.
    async fn get(&self, message: &str) -> Result<Option<String>>;

    /// Store a message-reply pair.
    async fn set(&self, message: &str, reply: &str) -> Result<()>;

    /// Invalidate cache entries whose key contains `pattern`.
    async fn invalidate(&self, pattern: &str) -> Result<()>;
}

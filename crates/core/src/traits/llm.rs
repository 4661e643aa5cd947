//! Backend provider traits.

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Turn;

/// A single text-generation backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce a reply to the conversation, whose last turn is the user's.
    ///
    /// Fails with [`crate::Error::Backend`] on network failure, non-success
    /// status, or a response without a reply.
    async fn chat(&self, conversation: &[Turn]) -> Result<String>;

    /// Check that the backend is reachable with the configured credential.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

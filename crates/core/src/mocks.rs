//! Mock implementations of core traits for testing.
//!
//! These are shared across crates so the orchestrator, the fallback chain,
//! and the HTTP layer can be exercised without real backends.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    traits::{ChatBackend, ResponseCache},
    types::Turn,
    Error, Result,
};

// =============================================================================
// Mock Backend
// =============================================================================

enum Behavior {
    /// Always reply with the same text.
    Constant(String),
    /// Reply with "<prefix>: <last user message>".
    Echo(String),
    /// Pop scripted results in order, failing once exhausted.
    Scripted(Mutex<VecDeque<Result<String>>>),
    /// Always fail with a backend error.
    Failing,
}

/// Mock backend that counts calls and records the last conversation it saw.
pub struct MockBackend {
    name: String,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_conversation: Mutex<Vec<Turn>>,
}

impl MockBackend {
    fn with_behavior(name: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_conversation: Mutex::new(Vec::new()),
        }
    }

    /// A backend that always returns `reply`.
    pub fn constant(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::Constant(reply.into()))
    }

    /// A backend that echoes the last user message behind `prefix`.
    pub fn echo(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::Echo(prefix.into()))
    }

    /// A backend that replays `results` in order.
    pub fn scripted(name: impl Into<String>, results: Vec<Result<String>>) -> Self {
        Self::with_behavior(name, Behavior::Scripted(Mutex::new(results.into())))
    }

    /// A backend that always fails.
    pub fn failing(name: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::Failing)
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `chat` calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conversation passed to the most recent call.
    pub fn last_conversation(&self) -> Vec<Turn> {
        self.last_conversation.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, conversation: &[Turn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_conversation.lock().unwrap() = conversation.to_vec();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Constant(reply) => Ok(reply.clone()),
            Behavior::Echo(prefix) => {
                let last = conversation.last().map(|t| t.content.as_str()).unwrap_or("");
                Ok(format!("{}: {}", prefix, last))
            }
            Behavior::Scripted(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::backend(&self.name, None, "script exhausted"))),
            Behavior::Failing => Err(Error::backend(&self.name, Some(503), "mock failure")),
        }
    }
}

// =============================================================================
// Mock Response Cache
// =============================================================================

/// Exact-key cache without normalization, for tests that need to seed or
/// inspect entries directly.
#[derive(Default)]
pub struct MockResponseCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MockResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry.
    pub fn with_entry(self, message: &str, reply: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(message.to_string(), reply.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for MockResponseCache {
    async fn get(&self, message: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(message).cloned())
    }

    async fn set(&self, message: &str, reply: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(message.to_string(), reply.to_string());
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .retain(|k, _| !k.contains(pattern));
        Ok(())
    }
}

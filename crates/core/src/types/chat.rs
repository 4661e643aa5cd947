//! Inbound chat payloads and pipeline outcomes.

use serde::{Deserialize, Serialize};

/// Inbound chat request.
///
/// Both fields are optional at the wire level so that a missing field is
/// reported as a validation reply rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Free-text user message.
    #[serde(default)]
    pub message: Option<String>,
    /// Caller-defined conversation scope.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Create a request with both fields set.
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            session_id: Some(session_id.into()),
        }
    }
}

/// Outbound reply body. Every path, including failures, uses this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Which pipeline stage produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Missing message or session id.
    Invalid,
    /// Session reached its reply quota.
    QuotaExceeded,
    /// Canned identity reply.
    Identity,
    /// Served from the response cache.
    Cached,
    /// Produced by a backend provider.
    Backend,
    /// Every provider failed.
    Degraded,
}

impl ReplyKind {
    /// HTTP status for this kind of reply.
    pub fn status_code(&self) -> u16 {
        match self {
            ReplyKind::Invalid => 400,
            ReplyKind::Degraded => 500,
            _ => 200,
        }
    }

    /// Whether a reply of this kind counts against the session quota.
    pub fn is_countable(&self) -> bool {
        matches!(
            self,
            ReplyKind::Identity | ReplyKind::Cached | ReplyKind::Backend
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Invalid => "invalid",
            ReplyKind::QuotaExceeded => "quota_exceeded",
            ReplyKind::Identity => "identity",
            ReplyKind::Cached => "cached",
            ReplyKind::Backend => "backend",
            ReplyKind::Degraded => "degraded",
        }
    }
}

/// Result of running one request through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Reply text.
    pub reply: String,
    /// Stage that produced the reply.
    pub kind: ReplyKind,
    /// Provider that served a backend reply.
    pub provider: Option<String>,
}

impl ChatOutcome {
    pub fn new(kind: ReplyKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            kind,
            provider: None,
        }
    }

    /// Attach the serving provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// HTTP status for this outcome.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Wire body for this outcome.
    pub fn to_reply(&self) -> ChatReply {
        ChatReply {
            reply: self.reply.clone(),
        }
    }
}

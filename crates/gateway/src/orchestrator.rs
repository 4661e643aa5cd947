//! Chat orchestrator.
//!
//! Runs one request through quota check, identity intent, response cache and
//! the provider fallback chain. The session lock is held for the whole
//! pipeline, so requests for the same session are serialized while different
//! sessions proceed concurrently.

use std::sync::Arc;
use uuid::Uuid;

use webs_core::{
    config::{AppConfig, ReplyConfig},
    traits::{IntentMatcher, ResponseCache, SessionStore},
    types::{ChatOutcome, ChatRequest, IntentMatch, ReplyKind, Session},
    Error, Result,
};
use webs_governance::track_reply;
use webs_model_gateway::{FallbackChain, ProviderReply};
use webs_store::InMemorySessionStore;

use crate::cache::InMemoryResponseCache;
use crate::intent::PhraseIntentMatcher;

/// Default number of countable replies per session.
pub const DEFAULT_MAX_REPLIES: u32 = 5;

/// Request pipeline shared by every HTTP handler.
#[derive(Clone)]
pub struct ChatOrchestrator {
    sessions: Arc<dyn SessionStore>,
    cache: Arc<dyn ResponseCache>,
    matcher: Arc<dyn IntentMatcher>,
    providers: FallbackChain,
    max_replies: u32,
    replies: ReplyConfig,
}

impl ChatOrchestrator {
    pub fn builder() -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder::new()
    }

    /// The provider chain, in fallback order.
    pub fn providers(&self) -> &FallbackChain {
        &self.providers
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Handle one chat request. Never fails; errors become degraded replies.
    pub async fn handle(&self, request: &ChatRequest) -> ChatOutcome {
        let trace_id = Uuid::new_v4().to_string();
        let outcome = self.run(request, &trace_id).await;

        track_reply(outcome.kind);
        tracing::info!(
            trace_id = %trace_id,
            kind = outcome.kind.as_str(),
            status = outcome.status_code(),
            provider = outcome.provider.as_deref().unwrap_or("-"),
            "Chat request handled"
        );
        outcome
    }

    async fn run(&self, request: &ChatRequest, trace_id: &str) -> ChatOutcome {
        let (message, session_id) = match self.validate(request) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!(trace_id = %trace_id, error = %e, "Rejected chat request");
                let reply = match e {
                    Error::InvalidRequest(reply) => reply,
                    other => other.to_string(),
                };
                return ChatOutcome::new(ReplyKind::Invalid, reply);
            }
        };

        let handle = match self.sessions.get_or_create(session_id).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(trace_id = %trace_id, session_id = %session_id, error = %e, "Failed to load session");
                return ChatOutcome::new(ReplyKind::Degraded, &self.replies.degraded);
            }
        };
        let mut session = handle.lock().await;

        if session.is_over_limit(self.max_replies) {
            tracing::debug!(trace_id = %trace_id, session_id = %session_id, used = session.used_count, "Session over limit");
            return ChatOutcome::new(ReplyKind::QuotaExceeded, &self.replies.limit_reached);
        }

        let outcome = self.respond(&session, message, trace_id).await;

        // Only countable replies commit the exchange; a degraded reply leaves
        // the session exactly as it was.
        if outcome.kind.is_countable() {
            session.append_exchange(message, outcome.reply.as_str());
            let used = session.increment_usage();
            tracing::debug!(trace_id = %trace_id, session_id = %session_id, kind = outcome.kind.as_str(), used, "Exchange recorded");
        }
        outcome
    }

    /// Both fields must be present and non-blank. The error carries the reply
    /// text the caller sees.
    fn validate<'a>(&self, request: &'a ChatRequest) -> Result<(&'a str, &'a str)> {
        let message = non_blank(request.message.as_deref())
            .ok_or_else(|| Error::invalid_request(self.replies.missing_message.as_str()))?;
        let session_id = non_blank(request.session_id.as_deref())
            .ok_or_else(|| Error::invalid_request(self.replies.missing_session.as_str()))?;
        Ok((message, session_id))
    }

    /// Identity intent, then response cache, then the provider chain.
    async fn respond(&self, session: &Session, message: &str, trace_id: &str) -> ChatOutcome {
        if let IntentMatch {
            is_match: true,
            reply: Some(reply),
        } = self.matcher.classify(message)
        {
            return ChatOutcome::new(ReplyKind::Identity, reply);
        }

        match self.cache.get(message).await {
            Ok(Some(reply)) => {
                tracing::debug!(trace_id = %trace_id, session_id = %session.id, "Serving cached reply");
                return ChatOutcome::new(ReplyKind::Cached, reply);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(trace_id = %trace_id, error = %e, "Cache lookup failed");
            }
        }

        let conversation = session.conversation_with(message);
        match self.providers.reply(&conversation).await {
            Ok(ProviderReply { provider, content }) => {
                // A reply that saw earlier turns may depend on them; only
                // context-free answers are shared across sessions.
                if session.history.is_empty() {
                    if let Err(e) = self.cache.set(message, &content).await {
                        tracing::warn!(trace_id = %trace_id, error = %e, "Cache write failed");
                    }
                }
                ChatOutcome::new(ReplyKind::Backend, content).with_provider(provider)
            }
            Err(e) => {
                tracing::error!(trace_id = %trace_id, session_id = %session.id, error = %e, "All providers failed");
                ChatOutcome::new(ReplyKind::Degraded, &self.replies.degraded)
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builder for constructing a ChatOrchestrator.
pub struct ChatOrchestratorBuilder {
    sessions: Option<Arc<dyn SessionStore>>,
    cache: Option<Arc<dyn ResponseCache>>,
    matcher: Option<Arc<dyn IntentMatcher>>,
    providers: FallbackChain,
    max_replies: u32,
    replies: ReplyConfig,
}

impl ChatOrchestratorBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            sessions: None,
            cache: None,
            matcher: None,
            providers: FallbackChain::default(),
            max_replies: DEFAULT_MAX_REPLIES,
            replies: ReplyConfig::default(),
        }
    }

    /// Take limits and reply texts from the application config.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.max_replies = config.session.max_replies;
        self.replies = config.replies.clone();
        self
    }

    /// Set the session store.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Set the response cache.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the identity intent matcher.
    pub fn with_matcher(mut self, matcher: Arc<dyn IntentMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Set the provider fallback chain.
    pub fn with_providers(mut self, providers: FallbackChain) -> Self {
        self.providers = providers;
        self
    }

    /// Set the per-session reply quota.
    pub fn with_max_replies(mut self, max_replies: u32) -> Self {
        self.max_replies = max_replies;
        self
    }

    /// Set the fixed reply texts.
    pub fn with_replies(mut self, replies: ReplyConfig) -> Self {
        self.replies = replies;
        self
    }

    /// Build the orchestrator, filling unset components with in-memory defaults.
    pub fn build(self) -> ChatOrchestrator {
        ChatOrchestrator {
            sessions: self
                .sessions
                .unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(InMemoryResponseCache::new())),
            matcher: self
                .matcher
                .unwrap_or_else(|| Arc::new(PhraseIntentMatcher::default())),
            providers: self.providers,
            max_replies: self.max_replies,
            replies: self.replies,
        }
    }
}

impl Default for ChatOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

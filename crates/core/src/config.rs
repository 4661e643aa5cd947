//! Layered application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `config/default`,
//! `config/{WEBS_ENV}`, `config/local`, then `APP__SECTION__KEY` env vars.

use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::DEFAULT_MAX_HISTORY_TURNS;

/// Minimum bigram similarity for a fuzzy identity match.
///
/// 0.7 accepts small paraphrases and typos ("who create you", "who made u")
/// while rejecting messages that merely share a couple of words with a phrase.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Default per-attempt backend timeout.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub identity: IdentityConfig,
    pub replies: ReplyConfig,
    pub model_gateway: ModelGatewayConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub enable_tracing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            allowed_origins: vec!["*".into()],
            enable_tracing: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Countable replies a session may receive.
    pub max_replies: u32,
    pub max_history_turns: usize,
    /// Sessions idle longer than this are pruned.
    pub idle_ttl_secs: u64,
    pub prune_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_replies: 5,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            idle_ttl_secs: 24 * 3600,
            prune_interval_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime. Unset means entries never expire.
    pub ttl_secs: Option<u64>,
    /// Capacity. Unset means unbounded.
    pub max_entries: Option<usize>,
    /// How often expired entries are swept when `ttl_secs` is set.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            max_entries: None,
            cleanup_interval_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IdentityConfig {
    pub phrases: Vec<String>,
    pub threshold: f64,
    pub reply: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            phrases: [
                "who created you",
                "who are you",
                "describe yourself",
                "tell me about yourself",
                "introduce yourself",
                "i want to know more about you",
                "who made you",
                "who built you",
                "who developed you",
                "who invented you",
                "who designed you",
                "who programmed you",
                "who is your creator",
                "who is your owner",
                "who is your founder",
                "where do you come from",
                "so its edison chazumbwa who made you",
                "who is edison chazumbwa",
                "do you know edison chazumbwa",
                "who runs you",
                "who produced you",
                "who authored you",
                "who coded you",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            reply: "I am Webs, created and trained by Edison Chazumbwa. He is currently a student \
                    at the University of Malawi. If you want to know more about him go to the \
                    ABOUT section at the top left corner."
                .into(),
        }
    }
}

/// Fixed replies for the non-backend paths.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReplyConfig {
    pub limit_reached: String,
    pub degraded: String,
    pub missing_message: String,
    pub missing_session: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            limit_reached: "You have reached the message limit for this session. Please start a new session to continue.".into(),
            degraded: "All AI models failed. Please try again later.".into(),
            missing_message: "⚠️ No message provided.".into(),
            missing_session: "⚠️ No session id provided.".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelGatewayConfig {
    /// Provider names in fallback order. Empty keeps table order.
    pub provider_order: Vec<String>,
    pub providers: Vec<ProviderDefinition>,
}

impl Default for ModelGatewayConfig {
    fn default() -> Self {
        let openrouter = |name: &str, model: &str| ProviderDefinition {
            name: name.into(),
            endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
            model: model.into(),
            api_key_env: Some("OPENROUTER_API_KEY".into()),
            models_url: Some("https://openrouter.ai/api/v1/models".into()),
            ..ProviderDefinition::default()
        };

        Self {
            provider_order: Vec::new(),
            providers: vec![
                openrouter("openrouter-llama-3.1-8b", "meta-llama/llama-3.1-8b-instruct:free"),
                openrouter("openrouter-mistral-7b", "mistralai/mistral-7b-instruct:free"),
                openrouter("openrouter-nous-capybara-7b", "nousresearch/nous-capybara-7b:free"),
                ProviderDefinition {
                    name: "groq".into(),
                    endpoint: "https://api.groq.com/openai/v1/chat/completions".into(),
                    model: "llama3-70b-8192".into(),
                    api_key_env: Some("GROQ_API_KEY".into()),
                    models_url: Some("https://api.groq.com/openai/v1/models".into()),
                    ..ProviderDefinition::default()
                },
                ProviderDefinition {
                    name: "gemini".into(),
                    endpoint: "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent".into(),
                    model: "gemini-2.0-flash".into(),
                    shape: RequestShape::GeminiGenerate,
                    auth: AuthScheme::Query { param: "key".into() },
                    api_key_env: Some("GEMINI_API_KEY".into()),
                    ..ProviderDefinition::default()
                },
            ],
        }
    }
}

/// Request/response layout spoken by a backend.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestShape {
    /// Flat `messages` list, reply under `choices[0].message.content`.
    #[default]
    #[serde(rename = "openai_chat")]
    OpenAiChat,
    /// `contents` with role-renamed `parts`, reply is the joined text of
    /// every entry in `candidates[0].content.parts`.
    #[serde(rename = "gemini_generate")]
    GeminiGenerate,
}

/// How the credential is attached to outbound requests.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`.
    #[default]
    Bearer,
    /// `<name>: <key>`.
    Header { name: String },
    /// `?<param>=<key>`.
    Query { param: String },
}

/// One entry in the ordered provider table.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderDefinition {
    pub name: String,
    /// Chat endpoint. `{model}` is replaced with `model`.
    pub endpoint: String,
    pub model: String,
    pub shape: RequestShape,
    pub auth: AuthScheme,
    pub api_key: Option<Secret<String>>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    /// Listing endpoint used for connectivity checks.
    pub models_url: Option<String>,
    pub enabled: bool,
}

impl Default for ProviderDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            endpoint: String::new(),
            model: String::new(),
            shape: RequestShape::default(),
            auth: AuthScheme::default(),
            api_key: None,
            api_key_env: None,
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            models_url: None,
            enabled: true,
        }
    }
}

impl ProviderDefinition {
    /// Resolve the credential from the config value or its environment variable.
    pub fn resolve_api_key(&self) -> Option<Secret<String>> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
    }

    /// Reject entries that could never produce a reply.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.endpoint.is_empty() {
            return Err(Error::config(format!(
                "provider entry '{}' needs a name and an endpoint",
                self.name
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config(format!(
                "provider '{}' has timeout_ms = 0",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub json_logs: bool,
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            metrics: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("WEBS_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SESSION__MAX_REPLIES=10 to session.max_replies
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("model_gateway.provider_order")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.identity.threshold) {
            return Err(Error::config(format!(
                "identity.threshold must be within [0, 1], got {}",
                self.identity.threshold
            )));
        }
        if self.session.max_history_turns < 2 {
            return Err(Error::config("session.max_history_turns must be at least 2"));
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err(Error::config("cache.cleanup_interval_secs must be at least 1"));
        }
        for provider in &self.model_gateway.providers {
            provider.validate()?;
        }
        Ok(())
    }
}

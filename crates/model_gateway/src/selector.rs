//! Ordered provider fallback.

use reqwest::Client;
use std::sync::Arc;

use webs_core::{
    config::ProviderDefinition,
    traits::ChatBackend,
    types::Turn,
    Error, Result,
};
use webs_governance::track_provider_attempt;

use crate::providers::HttpProvider;

/// A reply together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub provider: String,
    pub content: String,
}

/// Providers tried strictly in order, one attempt each, until one succeeds.
///
/// Providers are never raced: a later provider is only contacted after every
/// earlier one has failed.
#[derive(Clone, Default)]
pub struct FallbackChain {
    providers: Vec<Arc<dyn ChatBackend>>,
}

impl FallbackChain {
    /// Create a chain over `providers`, in priority order.
    pub fn new(providers: Vec<Arc<dyn ChatBackend>>) -> Self {
        Self { providers }
    }

    /// Append a provider at the lowest priority.
    pub fn with_provider(mut self, provider: Arc<dyn ChatBackend>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build HTTP providers from the configured table.
    ///
    /// Disabled entries and entries without a resolvable API key are skipped.
    /// A non-empty `order` selects and orders providers by name.
    pub fn from_definitions(definitions: &[ProviderDefinition], order: &[String]) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("webs-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut chain = Self::default();
        for definition in order_definitions(definitions, order) {
            match definition.resolve_api_key() {
                Some(key) => {
                    chain = chain.with_provider(Arc::new(HttpProvider::new(
                        definition,
                        key,
                        client.clone(),
                    )));
                }
                None => {
                    tracing::warn!(
                        provider = %definition.name,
                        env = ?definition.api_key_env,
                        "No API key for provider, skipping"
                    );
                }
            }
        }

        tracing::info!(providers = ?chain.names(), "Provider chain ready");
        Ok(chain)
    }

    /// Provider names in priority order.
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn providers(&self) -> &[Arc<dyn ChatBackend>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Get a reply from the first provider that succeeds.
    ///
    /// Fails with [`Error::AllProvidersFailed`] once every provider has failed.
    pub async fn reply(&self, conversation: &[Turn]) -> Result<ProviderReply> {
        let mut attempts = 0;

        for provider in &self.providers {
            attempts += 1;
            tracing::debug!(provider = provider.name(), attempt = attempts, "Trying provider");

            match provider.chat(conversation).await {
                Ok(content) => {
                    track_provider_attempt(provider.name(), "success");
                    tracing::info!(provider = provider.name(), "Provider succeeded");
                    return Ok(ProviderReply {
                        provider: provider.name().to_string(),
                        content,
                    });
                }
                Err(e) => {
                    track_provider_attempt(provider.name(), "failure");
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        tracing::error!(attempts = attempts, "All providers failed");
        Err(Error::AllProvidersFailed { attempts })
    }
}

/// Enabled definitions in fallback order.
fn order_definitions<'a>(
    definitions: &'a [ProviderDefinition],
    order: &[String],
) -> Vec<&'a ProviderDefinition> {
    let enabled = definitions.iter().filter(|d| d.enabled);

    if order.is_empty() {
        return enabled.collect();
    }

    let enabled: Vec<&ProviderDefinition> = enabled.collect();
    let mut ordered = Vec::with_capacity(order.len());
    for name in order {
        match enabled.iter().find(|d| d.name.eq_ignore_ascii_case(name.trim())) {
            Some(definition) if !ordered.iter().any(|o: &&ProviderDefinition| o.name == definition.name) => {
                ordered.push(*definition)
            }
            Some(_) => {}
            None => tracing::warn!(provider = %name, "Unknown or disabled provider in provider_order"),
        }
    }
    ordered
}

//! HTTP provider adapter.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::time::Duration;

use webs_core::{
    config::{AuthScheme, ProviderDefinition, RequestShape},
    traits::ChatBackend,
    types::Turn,
    Error, Result,
};

use crate::wire::wire_format;

/// Longest error body excerpt kept in a backend error.
const ERROR_BODY_EXCERPT: usize = 200;

/// One configured backend reached over HTTP.
pub struct HttpProvider {
    name: String,
    endpoint: String,
    model: String,
    shape: RequestShape,
    auth: AuthScheme,
    api_key: Secret<String>,
    timeout: Duration,
    models_url: Option<String>,
    client: Client,
}

impl HttpProvider {
    /// Create a provider from its table entry and resolved credential.
    pub fn new(definition: &ProviderDefinition, api_key: Secret<String>, client: Client) -> Self {
        Self {
            name: definition.name.clone(),
            endpoint: definition.endpoint.replace("{model}", &definition.model),
            model: definition.model.clone(),
            shape: definition.shape,
            auth: definition.auth.clone(),
            api_key,
            timeout: Duration::from_millis(definition.timeout_ms),
            models_url: definition.models_url.clone(),
            client,
        }
    }

    /// Resolved chat endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Attach the credential according to the auth scheme.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        match &self.auth {
            AuthScheme::Bearer => builder.bearer_auth(key),
            AuthScheme::Header { name } => builder.header(name.as_str(), key.as_str()),
            AuthScheme::Query { param } => builder.query(&[(param.as_str(), key.as_str())]),
        }
    }

    /// Map a reqwest failure to a backend error. The URL is stripped because
    /// query authentication puts the API key in it.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        let e = e.without_url();
        if e.is_timeout() {
            Error::backend(
                &self.name,
                None,
                format!("timed out after {}ms", self.timeout.as_millis()),
            )
        } else {
            Error::backend(&self.name, None, format!("HTTP request failed: {}", e))
        }
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > ERROR_BODY_EXCERPT {
        let cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl ChatBackend for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, conversation: &[Turn]) -> Result<String> {
        let wire = wire_format(self.shape);
        let body = wire.request_body(&self.model, conversation);

        tracing::debug!(
            provider = %self.name,
            model = %self.model,
            turns = conversation.len(),
            "Calling provider"
        );

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::backend(&self.name, Some(status.as_u16()), excerpt(&text)));
        }

        let body: Value = response.json().await.map_err(|e| {
            Error::backend(
                &self.name,
                Some(status.as_u16()),
                format!("invalid JSON body: {}", e.without_url()),
            )
        })?;

        wire.extract_reply(&body).ok_or_else(|| {
            Error::backend(
                &self.name,
                Some(status.as_u16()),
                "response has no reply text",
            )
        })
    }

    async fn health_check(&self) -> Result<()> {
        let Some(url) = &self.models_url else {
            return Ok(());
        };

        let response = self
            .authorize(self.client.get(url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::backend(&self.name, Some(status.as_u16()), "health check failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini_definition() -> ProviderDefinition {
        ProviderDefinition {
            name: "gemini".into(),
            endpoint: "https://example.test/v1beta/models/{model}:generateContent".into(),
            model: "gemini-2.0-flash".into(),
            shape: RequestShape::GeminiGenerate,
            auth: AuthScheme::Query { param: "key".into() },
            ..ProviderDefinition::default()
        }
    }

    #[test]
    fn test_model_placeholder_is_resolved() {
        let provider = HttpProvider::new(
            &gemini_definition(),
            Secret::new("k".into()),
            Client::new(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_query_auth_appends_key() {
        let provider = HttpProvider::new(
            &gemini_definition(),
            Secret::new("abc".into()),
            Client::new(),
        );
        let request = provider
            .authorize(provider.client.post(provider.endpoint()))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("key=abc"));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), ERROR_BODY_EXCERPT + 3);
        assert_eq!(excerpt("  short  "), "short");
    }
}

//! Error types for the Webs gateway.

use thiserror::Error;

/// Result type alias using the gateway's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the Webs gateway.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Gateway Errors
    // =========================================================================
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =========================================================================
    // Model Gateway Errors
    // =========================================================================
    #[error("Provider '{provider}' failed{}: {cause}", status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    Backend {
        provider: String,
        status: Option<u16>,
        cause: String,
    },

    #[error("All providers failed after {attempts} attempt(s)")]
    AllProvidersFailed { attempts: usize },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a gateway error.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a backend error for a single provider attempt.
    pub fn backend(provider: impl Into<String>, status: Option<u16>, cause: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            status,
            cause: cause.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display_with_status() {
        let err = Error::backend("groq", Some(503), "service unavailable");
        assert_eq!(
            err.to_string(),
            "Provider 'groq' failed with status 503: service unavailable"
        );
    }

    #[test]
    fn test_backend_display_without_status() {
        let err = Error::backend("gemini", None, "connection refused");
        assert_eq!(err.to_string(), "Provider 'gemini' failed: connection refused");
    }

    #[test]
    fn test_all_failed_display() {
        let err = Error::AllProvidersFailed { attempts: 3 };
        assert_eq!(err.to_string(), "All providers failed after 3 attempt(s)");
    }

    #[test]
    fn test_invalid_request_carries_reply_text() {
        let err = Error::invalid_request("⚠️ No message provided.");
        assert!(matches!(&err, Error::InvalidRequest(reply) if reply == "⚠️ No message provided."));
        assert_eq!(err.to_string(), "Invalid request: ⚠️ No message provided.");
    }
}

//! Completion boundary
//!
//! The one external call the engine makes: send an interpolated prompt to a
//! chat-completion service and read back usage and text. `CompletionBoundary`
//! is the seam; `OpenAiClient` is the HTTP implementation.

pub mod chat;
pub mod client;
pub mod credentials;

pub use chat::{ChatMessage, Choice, CompletionRequest, CompletionResponse, MessageRole, Usage};
pub use client::OpenAiClient;
pub use credentials::Credentials;

use std::time::Duration;

/// Failures reported by the completion boundary
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// 401/403 from the provider, or a credential unusable as a header
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// 429 from the provider
    #[error("rate limited{}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-success status
    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Connection, DNS, TLS or timeout failure
    #[error("network error: {message}")]
    Network { message: String },

    /// Success status with a body that is not a completion response
    #[error("failed to decode provider response: {message}")]
    Decode { message: String },

    /// Client-side configuration problem (bad base URL and similar)
    #[error("invalid client configuration: {message}")]
    Config { message: String },
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {:?}", d),
        None => String::new(),
    }
}

impl ProviderError {
    /// Errors that will keep failing until the user changes something
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Config { .. })
    }
}

/// External chat-completion service
///
/// Implementations must be safe to call concurrently; the dispatcher holds
/// no lock around the call.
#[async_trait::async_trait]
pub trait CompletionBoundary: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
        credentials: &Credentials,
    ) -> Result<CompletionResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let err = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 2s");

        let err = ProviderError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_requires_user_action() {
        assert!(ProviderError::Unauthorized {
            message: "bad key".to_string()
        }
        .requires_user_action());
        assert!(!ProviderError::Network {
            message: "reset".to_string()
        }
        .requires_user_action());
    }
}

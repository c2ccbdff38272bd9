//! OpenAI-compatible chat completion client
//!
//! Works against anything that speaks `POST {base_url}/chat/completions`
//! (OpenAI, OpenRouter, Ollama, LM Studio). One attempt per call: retry is a
//! manual user action.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient, StatusCode,
};

use super::{CompletionBoundary, CompletionRequest, CompletionResponse, Credentials, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP implementation of the completion boundary
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    http_client: HttpClient,
}

impl OpenAiClient {
    /// Create a client for `base_url`; `timeout` bounds each request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = sanitize_base_url(base_url)?;
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("promptbench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self, credentials: &Credentials) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(AUTHORIZATION, credentials.bearer_header()?);

        // OpenRouter attribution headers
        if self.base_url.contains("openrouter.ai") {
            headers.insert(
                "X-Title",
                reqwest::header::HeaderValue::from_static("promptbench"),
            );
        }

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl CompletionBoundary for OpenAiClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        credentials: &Credentials,
    ) -> Result<CompletionResponse, ProviderError> {
        let headers = self.build_headers(credentials)?;

        tracing::debug!(
            model = %request.model,
            url = %self.endpoint(),
            "sending chat completion request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await.map_err(|e| ProviderError::Network {
                message: format!("failed to read response body: {}", e),
            })?;
            return serde_json::from_str(&text).map_err(|e| {
                tracing::error!("Failed to parse completion response: {}. Raw body: {}", e, text);
                ProviderError::Decode {
                    message: e.to_string(),
                }
            });
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized {
                message: error_message(response).await,
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(ProviderError::RateLimited { retry_after })
            }
            status => Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }
}

/// Pull `error.message` out of a provider error body
async fn error_message(response: reqwest::Response) -> String {
    let error_body: Option<serde_json::Value> = response.json().await.ok();
    error_body
        .as_ref()
        .and_then(|v| v.get("error").and_then(|e| e.get("message")))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

/// Validate a base URL before building request URLs from it
pub fn sanitize_base_url(url: &str) -> Result<String, ProviderError> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(ProviderError::Config {
            message: "base URL cannot be empty".to_string(),
        });
    }

    // Encoded separators usually mean the value was double-encoded somewhere
    if trimmed.contains("%2F") || trimmed.contains("%3D") || trimmed.contains("%20") {
        return Err(ProviderError::Config {
            message: format!("base URL appears to be URL-encoded: {}", trimmed),
        });
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ProviderError::Config {
            message: format!("base URL must start with 'http://' or 'https://'. Got: {}", trimmed),
        });
    }

    Ok(trimmed.to_string())
}

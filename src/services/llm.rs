use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Failure classification for one generation call. No variant triggers an
/// automatic retry here; that decision belongs to the orchestrator.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM credential is not configured")]
    NotConfigured,
    #[error("provider quota exceeded")]
    QuotaExceeded { retry_after: Option<u64> },
    #[error("no response from provider within {0:?}")]
    Timeout(Duration),
    #[error("provider error: {message}")]
    Upstream { message: String },
}

/// Seam between the orchestrator and the generation provider. Constructed
/// once at startup; absent entirely when no credential is configured.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Groq chat-completions client. JSON output is requested via
/// response_format, but downstream validation never trusts that.
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config
            .groq_api_key
            .as_ref()
            .map(|key| Self::new(key, &config.groq_model, config.llm_timeout))
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

fn retry_after_seconds(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[async_trait]
impl LlmBackend for GroqClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.7,
            "response_format": {"type": "json_object"},
        });

        debug!(model = %self.model, "calling generation provider");
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => return Err(LlmError::Timeout(self.timeout)),
            Ok(Err(err)) if err.is_timeout() => return Err(LlmError::Timeout(self.timeout)),
            Ok(Err(err)) => {
                return Err(LlmError::Upstream {
                    message: format!("request failed: {err}"),
                })
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_seconds(&response);
            warn!(?retry_after, "provider rate limit hit");
            return Err(LlmError::QuotaExceeded { retry_after });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(LlmError::Upstream {
                message: format!("provider returned {status}: {message}"),
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|err| {
            LlmError::Upstream {
                message: format!("malformed provider response: {err}"),
            }
        })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Upstream {
                message: "provider response contained no choices".to_string(),
            })?;

        debug!(chars = content.len(), "provider call successful");
        Ok(content)
    }
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

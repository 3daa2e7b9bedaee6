//! OpenAI-compatible generation provider.
//!
//! Works with DeepSeek (the default), OpenAI, OpenRouter, Ollama, vLLM and
//! any endpoint exposing `/chat/completions`. Only non-streaming completions
//! are needed: the narrative synthesizer validates whole responses.

use std::time::Duration;

use async_trait::async_trait;
use dossier_config::GenerationConfig;
use dossier_core::error::ProviderError;
use dossier_core::message::Message;
use dossier_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// `timeout` is the transport-level ceiling; the retry policy applies its
    /// own per-attempt timeout on top.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build from the `[generation]` config section. Fails when no API key
    /// is configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key (set DEEPSEEK_API_KEY or generation.api_key)".into(),
            )
        })?;
        let name = if config.api_url.contains("deepseek") {
            "deepseek"
        } else {
            "openai-compatible"
        };
        Self::new(
            name,
            &config.api_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    /// Turn a decoded API response into a [`ProviderResponse`].
    fn parse_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::MalformedResponse(
                "Response message has no content".into(),
            ));
        }

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message::assistant(content),
            usage,
            model: api_response.model,
        })
    }
}

#[async_trait]
impl dossier_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: http::retry_after_secs(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_response)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::Provider;
    use dossier_core::message::Role;

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            OpenAiCompatProvider::new("x", "http://localhost:8000/v1/", "k", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn from_config_requires_key() {
        let config = GenerationConfig::default();
        assert!(matches!(
            OpenAiCompatProvider::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));

        let config = GenerationConfig {
            api_key: Some("sk".into()),
            ..GenerationConfig::default()
        };
        assert_eq!(OpenAiCompatProvider::from_config(&config).unwrap().name(), "deepseek");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn request_body_carries_sampling_settings() {
        let request = ProviderRequest {
            model: "deepseek-chat".into(),
            messages: vec![Message::user("Write")],
            temperature: 0.4,
            max_tokens: Some(4000),
        };
        let body = OpenAiCompatProvider::request_body(&request);
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{
            "model": "deepseek-chat",
            "choices": [{"message": {"role": "assistant", "content": "Para one.\n\nPara two."}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::parse_response(parsed).unwrap();
        assert_eq!(response.message.role, Role::Assistant);
        assert!(response.message.content.starts_with("Para one."));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn empty_choices_is_malformed() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"model":"m","choices":[],"usage":null}"#).unwrap();
        let err = OpenAiCompatProvider::parse_response(parsed).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn blank_content_is_malformed() {
        let parsed: ApiResponse = serde_json::from_str(
            r#"{"model":"m","choices":[{"message":{"role":"assistant","content":"  "}}]}"#,
        )
        .unwrap();
        assert!(OpenAiCompatProvider::parse_response(parsed).is_err());
    }
}

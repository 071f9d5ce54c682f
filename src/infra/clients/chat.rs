//! OpenAI-compatible chat completions client.
//!
//! Serves both Azure OpenAI deployments (`api-key` header, `api-version`
//! query) and the public OpenAI API (bearer token).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{LlmSettings, OPENAI_CHAT_COMPLETIONS_URL};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One message of a chat prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Language model used for summaries and record chat.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Text of the first choice.
    ///
    /// # Errors
    /// `AppError::Timeout` when the provider does not answer in time,
    /// `AppError::Upstream` for any other failure.
    async fn complete(&self, request: ChatRequest) -> AppResult<String>;
}

// ============================================
// WIRE TYPES
// ============================================

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

enum Credential {
    ApiKey(String),
    Bearer(String),
}

/// reqwest-backed chat completions client
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    url: String,
    model: String,
    credential: Credential,
    provider: &'static str,
}

impl ChatCompletionsClient {
    pub fn from_settings(settings: &LlmSettings, timeout_secs: u64) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        let (url, credential) = match settings {
            LlmSettings::AzureOpenAi {
                api_key,
                endpoint,
                model,
                api_version,
            } => (
                azure_completions_url(endpoint, model, api_version),
                Credential::ApiKey(api_key.clone()),
            ),
            LlmSettings::OpenAi { api_key } => (
                OPENAI_CHAT_COMPLETIONS_URL.to_string(),
                Credential::Bearer(api_key.clone()),
            ),
        };

        tracing::info!(
            provider = settings.provider_name(),
            model = settings.model(),
            "Initialized chat completions client"
        );

        Ok(Self {
            http,
            url,
            model: settings.model().to_string(),
            credential,
            provider: settings.provider_name(),
        })
    }
}

/// `{endpoint}/chat/completions?api-version={version}` with any `{model}`
/// placeholder in the endpoint replaced by the deployment name.
pub fn azure_completions_url(endpoint: &str, model: &str, api_version: &str) -> String {
    let base = endpoint.replace("{model}", model);
    let base = base.trim_end_matches('/');
    let base = if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    };
    format!("{}?api-version={}", base, api_version)
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, request: ChatRequest) -> AppResult<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let builder = self.http.post(&self.url).json(&body);
        let builder = match &self.credential {
            Credential::ApiKey(key) => builder.header("api-key", key),
            Credential::Bearer(key) => builder.bearer_auth(key),
        };

        tracing::debug!(provider = self.provider, "Sending chat completion request");
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(AppError::upstream(format!(
                "{} returned {}: {}",
                self.provider, status, detail
            )));
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::upstream(format!("{} returned no choices", self.provider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_url_substitutes_model() {
        assert_eq!(
            azure_completions_url(
                "https://res.openai.azure.com/openai/deployments/{model}",
                "gpt-4o",
                "2024-05-01-preview"
            ),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-05-01-preview"
        );
    }

    #[test]
    fn test_azure_url_keeps_explicit_path() {
        assert_eq!(
            azure_completions_url("https://models.inference.ai.azure.com/chat/completions/", "m", "v1"),
            "https://models.inference.ai.azure.com/chat/completions?api-version=v1"
        );
    }

    #[test]
    fn test_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = CompletionBody {
            model: "gpt-4o",
            messages: &messages,
            max_tokens: 4096,
            temperature: 0.5,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_response_parsing() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
    }
}

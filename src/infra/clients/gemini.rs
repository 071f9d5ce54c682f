//! Gemini `generateContent` client with Google Search grounding.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{GEMINI_API_BASE, GEMINI_MODEL};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Model that answers web-search prompts.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SearchModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(model = GEMINI_MODEL, "Initialized Gemini client");
        Ok(Self {
            http,
            api_key: api_key.to_string(),
        })
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "tools": [{ "google_search": {} }],
        "generationConfig": {
            "temperature": 1,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": 8192,
            "responseMimeType": "text/plain"
        }
    })
}

#[async_trait]
impl SearchModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, GEMINI_MODEL);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(AppError::upstream(format!("Gemini returned {}: {}", status, detail)));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .text()
            .ok_or_else(|| AppError::upstream("Gemini returned no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_enables_search_tool() {
        let body = request_body("latest sepsis guidelines");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "latest sepsis guidelines");
        assert!(body["tools"][0].get("google_search").is_some());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("ab"));
    }

    #[test]
    fn test_response_without_candidates() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.text().is_none());
    }
}

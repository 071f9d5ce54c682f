//! Assistant service - Language model prompts over a medical record.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::prompts::{
    chat_prompt, summary_prompt, CHAT_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use crate::config::{CHAT_TEMPERATURE, LLM_MAX_TOKENS, SUMMARY_TEMPERATURE};
use crate::domain::summary::organize_test_trends;
use crate::errors::{AppError, AppResult};
use crate::infra::clients::{ChatMessage, ChatRequest, LlmClient};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
});

static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\s*//.*$").expect("line comment pattern is valid"));

/// Assistant service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Structured JSON summary of a record, with lab trends organized.
    async fn structured_summary(&self, medical_text: &str) -> AppResult<Value>;

    /// Free-text answer to a doctor's question about a record.
    async fn chat_with_doctor(&self, medical_text: &str, question: &str) -> AppResult<String>;
}

/// Concrete implementation of AssistantService
pub struct Assistant {
    llm: Arc<dyn LlmClient>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AssistantService for Assistant {
    async fn structured_summary(&self, medical_text: &str) -> AppResult<Value> {
        let content = self
            .llm
            .complete(ChatRequest {
                messages: vec![
                    ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                    ChatMessage::user(summary_prompt(medical_text)),
                ],
                max_tokens: LLM_MAX_TOKENS,
                temperature: SUMMARY_TEMPERATURE,
            })
            .await?;

        let mut summary = extract_json(&content)?;
        organize_test_trends(&mut summary);
        Ok(summary)
    }

    async fn chat_with_doctor(&self, medical_text: &str, question: &str) -> AppResult<String> {
        self.llm
            .complete(ChatRequest {
                messages: vec![
                    ChatMessage::system(CHAT_SYSTEM_PROMPT),
                    ChatMessage::user(chat_prompt(medical_text, question)),
                ],
                max_tokens: LLM_MAX_TOKENS,
                temperature: CHAT_TEMPERATURE,
            })
            .await
    }
}

/// Pull a JSON object out of a model reply.
///
/// Looks for a fenced code block first, then the outermost braces. `//`
/// comments are stripped only when the candidate does not parse as is, so
/// URLs inside string values survive.
pub fn extract_json(content: &str) -> AppResult<Value> {
    let content = content.trim();
    tracing::debug!(len = content.len(), "Extracting JSON from model reply");

    let candidate = match FENCED_BLOCK.captures(content).and_then(|c| c.get(1)) {
        Some(block) => block.as_str().trim(),
        None => match (content.find('{'), content.rfind('}')) {
            (Some(start), Some(end)) if start < end => &content[start..=end],
            _ => {
                tracing::error!(
                    raw = %content.chars().take(200).collect::<String>(),
                    "No JSON content found in response"
                );
                return Err(AppError::upstream("No JSON content found in response"));
            }
        },
    };

    let parsed = serde_json::from_str::<Value>(candidate).or_else(|_| {
        let cleaned = LINE_COMMENT.replace_all(candidate, "");
        serde_json::from_str::<Value>(&cleaned)
    });

    match parsed {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(AppError::upstream("Response is not a JSON object")),
        Err(e) => {
            tracing::error!("JSON decode error: {}", e);
            Err(AppError::upstream(format!("Failed to parse JSON response: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::clients::MockLlmClient;
    use serde_json::json;

    #[test]
    fn test_extract_from_fenced_block() {
        let reply = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json(reply).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn test_extract_from_bare_braces() {
        let reply = "Summary follows {\"a\": {\"b\": 2}} end";
        assert_eq!(extract_json(reply).unwrap(), json!({ "a": { "b": 2 } }));
    }

    #[test]
    fn test_comments_stripped_only_when_needed() {
        let with_comment = "```\n{\n  \"a\": 1 // count\n}\n```";
        assert_eq!(extract_json(with_comment).unwrap(), json!({ "a": 1 }));

        let with_url = "{\"source\": \"https://example.org/lab\"}";
        assert_eq!(
            extract_json(with_url).unwrap()["source"],
            "https://example.org/lab"
        );
    }

    #[test]
    fn test_extract_rejects_non_objects() {
        assert!(extract_json("no json here").is_err());
        assert!(extract_json("```json\n[1, 2]\n```").is_err());
        assert!(extract_json("{ not json }").is_err());
    }

    #[tokio::test]
    async fn test_structured_summary_uses_low_temperature() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .withf(|req| {
                req.temperature == SUMMARY_TEMPERATURE
                    && req.max_tokens == LLM_MAX_TOKENS
                    && req.messages.len() == 2
                    && req.messages[1].content.contains("Hb 12.1")
            })
            .times(1)
            .returning(|_| {
                Ok("```json\n{\"lab_results\": {\"tests\": [{\"name\": \"Hb\", \"value\": \"12.1\", \"timestamp\": \"2024-01-01\"}]}}\n```".to_string())
            });

        let assistant = Assistant::new(Arc::new(llm));
        let summary = assistant.structured_summary("Hb 12.1").await.unwrap();

        assert_eq!(summary["lab_results"]["test_trends"][0]["test_name"], "Hb");
    }

    #[tokio::test]
    async fn test_chat_passes_question() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .withf(|req| {
                req.temperature == CHAT_TEMPERATURE
                    && req.messages[1].content.contains("Question from doctor: Trend?")
            })
            .returning(|_| Ok("Rising".to_string()));

        let assistant = Assistant::new(Arc::new(llm));
        assert_eq!(
            assistant.chat_with_doctor("record", "Trend?").await.unwrap(),
            "Rising"
        );
    }

    #[tokio::test]
    async fn test_summary_propagates_timeout() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().returning(|_| Err(AppError::Timeout));

        let assistant = Assistant::new(Arc::new(llm));
        assert!(matches!(
            assistant.structured_summary("x").await,
            Err(AppError::Timeout)
        ));
    }
}

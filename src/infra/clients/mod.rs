//! Outbound clients for external services.

pub mod chat;
pub mod gemini;
pub mod textract;

pub use chat::{ChatCompletionsClient, ChatMessage, ChatRequest, LlmClient};
pub use gemini::{GeminiClient, SearchModel};
pub use textract::{TextExtractor, TextractExtractor};

#[cfg(any(test, feature = "test-utils"))]
pub use chat::MockLlmClient;
#[cfg(any(test, feature = "test-utils"))]
pub use gemini::MockSearchModel;
#[cfg(any(test, feature = "test-utils"))]
pub use textract::MockTextExtractor;

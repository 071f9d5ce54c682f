//! Search service - Web search through a grounded language model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use super::prompts::search_prompt;
use crate::infra::clients::SearchModel;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Search request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1, message = "Query is required"))]
    #[schema(example = "latest guidance on sepsis fluid resuscitation")]
    pub query: String,
    /// Extra context prepended to the query
    #[schema(example = "adult ICU patient")]
    pub context: Option<String>,
}

/// Search outcome; failures are reported in the body
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub error: Option<String>,
    pub results: Option<String>,
}

impl SearchResponse {
    pub fn found(results: String) -> Self {
        Self {
            success: true,
            error: None,
            results: Some(results),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            results: None,
        }
    }
}

/// Search service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str, context: Option<String>) -> SearchResponse;
}

/// Concrete implementation of SearchService.
///
/// Without a model (no API key configured) every search fails.
pub struct WebSearch {
    model: Option<Arc<dyn SearchModel>>,
}

impl WebSearch {
    pub fn new(model: Option<Arc<dyn SearchModel>>) -> Self {
        if model.is_none() {
            tracing::warn!("No search API key configured; web search is disabled");
        }
        Self { model }
    }
}

#[async_trait]
impl SearchService for WebSearch {
    async fn search(&self, query: &str, context: Option<String>) -> SearchResponse {
        let Some(model) = &self.model else {
            return SearchResponse::failed("Search service not properly initialized");
        };

        let prompt = search_prompt(query, context.as_deref());
        match model.generate(&prompt).await {
            Ok(text) => SearchResponse::found(text),
            Err(e) => {
                tracing::error!("Error in web search: {}", e);
                SearchResponse::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::infra::clients::MockSearchModel;

    #[tokio::test]
    async fn test_search_with_context() {
        let mut model = MockSearchModel::new();
        model
            .expect_generate()
            .withf(|prompt| prompt == "Context: ICU\nQuery: sepsis")
            .returning(|_| Ok("answer".to_string()));

        let service = WebSearch::new(Some(Arc::new(model)));
        let response = service.search("sepsis", Some("ICU".into())).await;

        assert_eq!(response, SearchResponse::found("answer".into()));
    }

    #[tokio::test]
    async fn test_search_failure_is_reported_in_body() {
        let mut model = MockSearchModel::new();
        model.expect_generate().returning(|_| Err(AppError::Timeout));

        let service = WebSearch::new(Some(Arc::new(model)));
        let response = service.search("sepsis", None).await;

        assert!(!response.success);
        assert!(response.results.is_none());
        assert_eq!(response.error.as_deref(), Some("Request timed out"));
    }

    #[tokio::test]
    async fn test_search_without_model() {
        let service = WebSearch::new(None);
        let response = service.search("sepsis", None).await;
        assert!(!response.success);
    }
}

//! Medical record service - Upload processing and record-derived views.
//!
//! Every view over a record requires the doctor to have an active
//! consultation and a summary in the session store.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use super::container::parallel;
use super::{AssistantService, ConsultationService};
use crate::config::Environment;
use crate::domain::summary::{self, EntityAnalysis, Visualization};
use crate::domain::ConsultationMetrics;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::clients::TextExtractor;
use crate::infra::SessionStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const ACTIVE_CONSULTATION_EXISTS: &str =
    "You have an active consultation. Please close it before starting a new one.";
const NO_ACTIVE_CONSULTATION: &str =
    "You do not have an active consultation. Please start one first.";
const NO_RECORD: &str = "No medical record found. Please upload one first.";
const NO_ANALYSIS: &str = "No medical record analysis found. Please process a medical record first.";

/// Outcome of processing an uploaded record
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessedRecord {
    /// Structured summary produced by the language model
    #[schema(value_type = Object)]
    pub summary: Value,
    pub consultation_id: String,
    pub metrics: ConsultationMetrics,
}

/// Medical service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MedicalService: Send + Sync {
    /// Extract, summarize and store a record, then start a consultation.
    async fn process_record(
        &self,
        username: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<ProcessedRecord>;

    async fn chat(&self, username: &str, question: &str) -> AppResult<String>;

    async fn entities(&self, username: &str) -> AppResult<EntityAnalysis>;

    async fn visualizations(&self, username: &str) -> AppResult<Vec<Visualization>>;

    async fn visualization_by_title(&self, username: &str, title: &str) -> AppResult<Value>;

    async fn lab_results(&self, username: &str) -> AppResult<Vec<Value>>;

    /// Lab results whose test name matches `name` case-insensitively
    async fn tests_by_name(&self, username: &str, name: &str) -> AppResult<Vec<Value>>;

    async fn test_names(&self, username: &str) -> AppResult<Vec<String>>;

    /// Drop all cached session data. Returns the number of keys removed.
    async fn clear_session(&self, username: &str) -> AppResult<u64>;
}

/// Concrete implementation of MedicalService
pub struct MedicalRecords {
    consultations: Arc<dyn ConsultationService>,
    sessions: Arc<dyn SessionStore>,
    extractor: Arc<dyn TextExtractor>,
    assistant: Arc<dyn AssistantService>,
    environment: Environment,
}

impl MedicalRecords {
    pub fn new(
        consultations: Arc<dyn ConsultationService>,
        sessions: Arc<dyn SessionStore>,
        extractor: Arc<dyn TextExtractor>,
        assistant: Arc<dyn AssistantService>,
        environment: Environment,
    ) -> Self {
        Self {
            consultations,
            sessions,
            extractor,
            assistant,
            environment,
        }
    }

    async fn require_active(&self, username: &str) -> AppResult<()> {
        match self.consultations.active(username).await? {
            Some(_) => Ok(()),
            None => Err(AppError::bad_request(NO_ACTIVE_CONSULTATION)),
        }
    }

    async fn stored_summary(&self, username: &str) -> AppResult<Value> {
        self.require_active(username).await?;
        self.sessions
            .get_structured_summary(username)
            .await?
            .ok_or_else(|| AppError::bad_request(NO_ANALYSIS))
    }

    /// Development reuses text already extracted for the same file name.
    async fn extract(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<Option<String>> {
        if !self.environment.is_development() {
            return self.extractor.extract_text(bytes, file_name).await;
        }

        if let Some(cached) = self.sessions.get_cached_text(file_name).await? {
            tracing::debug!(file_name = %file_name, "Using cached extracted text");
            return Ok(Some(cached));
        }

        let text = self.extractor.extract_text(bytes, file_name).await?;
        if let Some(text) = text.as_deref() {
            self.sessions.set_cached_text(file_name, text).await?;
        }
        Ok(text)
    }
}

#[async_trait]
impl MedicalService for MedicalRecords {
    async fn process_record(
        &self,
        username: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<ProcessedRecord> {
        if self.consultations.active(username).await?.is_some() {
            return Err(AppError::bad_request(ACTIVE_CONSULTATION_EXISTS));
        }
        if file_name.trim().is_empty() {
            return Err(AppError::bad_request("No file selected"));
        }

        let text = self
            .extract(file_name, bytes)
            .await?
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("Failed to extract text from document"))?;
        tracing::info!(username = %username, file_name = %file_name, chars = text.len(), "Extracted record text");

        let summary = self.assistant.structured_summary(&text).await?;

        parallel::join2(
            self.sessions.set_medical_record(username, &text),
            self.sessions.set_structured_summary(username, &summary),
        )
        .await?;

        let consultation = self.consultations.start(username, file_name).await?;
        let metrics = self.consultations.metrics(username).await?;

        Ok(ProcessedRecord {
            summary,
            consultation_id: consultation.id,
            metrics,
        })
    }

    async fn chat(&self, username: &str, question: &str) -> AppResult<String> {
        self.require_active(username).await?;

        let record = self
            .sessions
            .get_medical_record(username)
            .await?
            .ok_or_else(|| AppError::bad_request(NO_RECORD))?;

        if question.trim().is_empty() {
            return Err(AppError::bad_request("Question is required"));
        }

        self.assistant.chat_with_doctor(&record, question).await
    }

    async fn entities(&self, username: &str) -> AppResult<EntityAnalysis> {
        let summary = self.stored_summary(username).await?;
        Ok(summary::entity_analysis(&summary))
    }

    async fn visualizations(&self, username: &str) -> AppResult<Vec<Visualization>> {
        let summary = self.stored_summary(username).await?;
        Ok(summary::processed_visualizations(&summary))
    }

    async fn visualization_by_title(&self, username: &str, title: &str) -> AppResult<Value> {
        let summary = self.stored_summary(username).await?;
        summary::visualization_by_title(&summary, title)
            .cloned()
            .ok_or_not_found("Visualization not found")
    }

    async fn lab_results(&self, username: &str) -> AppResult<Vec<Value>> {
        let summary = self.stored_summary(username).await?;
        Ok(summary::lab_results(&summary).to_vec())
    }

    async fn tests_by_name(&self, username: &str, name: &str) -> AppResult<Vec<Value>> {
        let summary = self.stored_summary(username).await?;
        Ok(summary::tests_by_name(&summary, name.trim()))
    }

    async fn test_names(&self, username: &str) -> AppResult<Vec<String>> {
        let summary = self.stored_summary(username).await?;
        Ok(summary::test_names(&summary))
    }

    async fn clear_session(&self, username: &str) -> AppResult<u64> {
        self.sessions.clear_user_data(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Consultation;
    use crate::infra::clients::MockTextExtractor;
    use crate::infra::MockSessionStore;
    use crate::services::{MockAssistantService, MockConsultationService};
    use chrono::Utc;
    use serde_json::json;

    struct Mocks {
        consultations: MockConsultationService,
        sessions: MockSessionStore,
        extractor: MockTextExtractor,
        assistant: MockAssistantService,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                consultations: MockConsultationService::new(),
                sessions: MockSessionStore::new(),
                extractor: MockTextExtractor::new(),
                assistant: MockAssistantService::new(),
            }
        }

        fn build(self, environment: Environment) -> MedicalRecords {
            MedicalRecords::new(
                Arc::new(self.consultations),
                Arc::new(self.sessions),
                Arc::new(self.extractor),
                Arc::new(self.assistant),
                environment,
            )
        }
    }

    fn open_consultation() -> Consultation {
        Consultation::start("c1".into(), "dr".into(), "scan.pdf".into(), Utc::now())
    }

    #[tokio::test]
    async fn test_process_rejects_when_consultation_active() {
        let mut mocks = Mocks::new();
        mocks
            .consultations
            .expect_active()
            .returning(|_| Ok(Some(open_consultation())));
        mocks.extractor.expect_extract_text().never();

        let service = mocks.build(Environment::Production);
        let err = service
            .process_record("dr", "scan.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref m) if m == ACTIVE_CONSULTATION_EXISTS));
    }

    #[tokio::test]
    async fn test_process_happy_path_in_production() {
        let mut mocks = Mocks::new();
        mocks.consultations.expect_active().returning(|_| Ok(None));
        mocks
            .extractor
            .expect_extract_text()
            .times(1)
            .returning(|_, _| Ok(Some("Hb 12.1".into())));
        mocks.sessions.expect_get_cached_text().never();
        mocks
            .assistant
            .expect_structured_summary()
            .returning(|_| Ok(json!({ "diagnosis": {} })));
        mocks
            .sessions
            .expect_set_medical_record()
            .withf(|user, text| user == "dr" && text == "Hb 12.1")
            .returning(|_, _| Ok(()));
        mocks
            .sessions
            .expect_set_structured_summary()
            .returning(|_, _| Ok(()));
        mocks
            .consultations
            .expect_start()
            .withf(|user, record| user == "dr" && record == "scan.pdf")
            .returning(|_, _| Ok(open_consultation()));
        mocks
            .consultations
            .expect_metrics()
            .returning(|_| Ok(ConsultationMetrics::default()));

        let service = mocks.build(Environment::Production);
        let processed = service
            .process_record("dr", "scan.pdf", vec![1])
            .await
            .unwrap();

        assert_eq!(processed.consultation_id, "c1");
        assert_eq!(processed.summary, json!({ "diagnosis": {} }));
    }

    #[tokio::test]
    async fn test_development_reuses_cached_text() {
        let mut mocks = Mocks::new();
        mocks.consultations.expect_active().returning(|_| Ok(None));
        mocks
            .sessions
            .expect_get_cached_text()
            .returning(|_| Ok(Some("cached".into())));
        mocks.extractor.expect_extract_text().never();
        mocks
            .assistant
            .expect_structured_summary()
            .withf(|text| text == "cached")
            .returning(|_| Ok(json!({})));
        mocks.sessions.expect_set_medical_record().returning(|_, _| Ok(()));
        mocks
            .sessions
            .expect_set_structured_summary()
            .returning(|_, _| Ok(()));
        mocks
            .consultations
            .expect_start()
            .returning(|_, _| Ok(open_consultation()));
        mocks
            .consultations
            .expect_metrics()
            .returning(|_| Ok(ConsultationMetrics::default()));

        let service = mocks.build(Environment::Development);
        assert!(service.process_record("dr", "scan.pdf", vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_extraction_is_bad_request() {
        let mut mocks = Mocks::new();
        mocks.consultations.expect_active().returning(|_| Ok(None));
        mocks
            .extractor
            .expect_extract_text()
            .returning(|_, _| Ok(Some("   ".into())));
        mocks.assistant.expect_structured_summary().never();

        let service = mocks.build(Environment::Production);
        let err = service
            .process_record("dr", "scan.pdf", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_views_require_active_consultation() {
        let mut mocks = Mocks::new();
        mocks.consultations.expect_active().returning(|_| Ok(None));

        let service = mocks.build(Environment::Production);
        let err = service.visualizations("dr").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == NO_ACTIVE_CONSULTATION));
    }

    #[tokio::test]
    async fn test_chat_requires_question() {
        let mut mocks = Mocks::new();
        mocks
            .consultations
            .expect_active()
            .returning(|_| Ok(Some(open_consultation())));
        mocks
            .sessions
            .expect_get_medical_record()
            .returning(|_| Ok(Some("record".into())));
        mocks.assistant.expect_chat_with_doctor().never();

        let service = mocks.build(Environment::Production);
        assert!(matches!(
            service.chat("dr", "  ").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_lab_results_filtered_by_name() {
        let mut mocks = Mocks::new();
        mocks
            .consultations
            .expect_active()
            .returning(|_| Ok(Some(open_consultation())));
        mocks.sessions.expect_get_structured_summary().returning(|_| {
            Ok(Some(json!({
                "lab_results": { "tests": [
                    { "name": "Hb", "value": "12" },
                    { "name": "Glucose", "value": "90" }
                ]}
            })))
        });

        let service = mocks.build(Environment::Production);
        assert_eq!(service.lab_results("dr").await.unwrap().len(), 2);
        assert_eq!(
            service.tests_by_name("dr", "hb").await.unwrap(),
            vec![json!({ "name": "Hb", "value": "12" })]
        );
    }

    #[tokio::test]
    async fn test_unknown_visualization_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .consultations
            .expect_active()
            .returning(|_| Ok(Some(open_consultation())));
        mocks
            .sessions
            .expect_get_structured_summary()
            .returning(|_| Ok(Some(json!({ "visualizations": [] }))));

        let service = mocks.build(Environment::Production);
        assert!(matches!(
            service.visualization_by_title("dr", "Heart Rate").await,
            Err(AppError::NotFound(_))
        ));
    }
}

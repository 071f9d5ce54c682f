//! Service Container - Builds every service once and hands out shared handles.
//!
//! Handlers only see the service traits; the concrete clients for MongoDB,
//! Redis, AWS and the language models are wired together here.

use std::future::Future;
use std::sync::Arc;

use super::{
    Assistant, AuthService, Authenticator, ConsultationManager, ConsultationService,
    MedicalRecords, MedicalService, SearchService, WebSearch,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::clients::{
    ChatCompletionsClient, GeminiClient, LlmClient, SearchModel, TextExtractor,
    TextractExtractor,
};
use crate::infra::{Cache, Database, Persistence, RedisSessionStore, SessionStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn consultations(&self) -> Arc<dyn ConsultationService>;

    fn medical(&self) -> Arc<dyn MedicalService>;

    fn search(&self) -> Arc<dyn SearchService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    consultation_service: Arc<dyn ConsultationService>,
    medical_service: Arc<dyn MedicalService>,
    search_service: Arc<dyn SearchService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        consultation_service: Arc<dyn ConsultationService>,
        medical_service: Arc<dyn MedicalService>,
        search_service: Arc<dyn SearchService>,
    ) -> Self {
        Self {
            auth_service,
            consultation_service,
            medical_service,
            search_service,
        }
    }

    /// Build the services over live connections.
    ///
    /// # Errors
    /// Fails when an HTTP client for a model provider cannot be built.
    pub async fn connect(config: &Config, database: &Database, cache: Cache) -> AppResult<Self> {
        let uow = Arc::new(Persistence::new(database));

        let llm: Arc<dyn LlmClient> = Arc::new(ChatCompletionsClient::from_settings(
            &config.llm,
            config.llm_timeout_secs,
        )?);
        let extractor: Arc<dyn TextExtractor> =
            Arc::new(TextractExtractor::connect(&config.aws).await);
        let sessions: Arc<dyn SessionStore> = Arc::new(RedisSessionStore::new(cache));
        let search_model = match config.gemini_api_key() {
            Some(key) => Some(Arc::new(GeminiClient::new(key, config.llm_timeout_secs)?)
                as Arc<dyn SearchModel>),
            None => None,
        };

        let auth_service = Arc::new(Authenticator::new(uow.clone(), config.clone()));
        let consultation_service: Arc<dyn ConsultationService> =
            Arc::new(ConsultationManager::new(uow));
        let medical_service = Arc::new(MedicalRecords::new(
            consultation_service.clone(),
            sessions,
            extractor,
            Arc::new(Assistant::new(llm)),
            config.environment,
        ));
        let search_service = Arc::new(WebSearch::new(search_model));

        tracing::info!(
            llm_provider = config.llm.provider_name(),
            model = config.llm.model(),
            "Services initialized"
        );

        Ok(Self::new(
            auth_service,
            consultation_service,
            medical_service,
            search_service,
        ))
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn consultations(&self) -> Arc<dyn ConsultationService> {
        self.consultation_service.clone()
    }

    fn medical(&self) -> Arc<dyn MedicalService> {
        self.medical_service.clone()
    }

    fn search(&self) -> Arc<dyn SearchService> {
        self.search_service.clone()
    }
}

/// Helpers for running independent operations concurrently.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[tokio::test]
    async fn test_parallel_join2() {
        async fn op1() -> AppResult<i32> {
            Ok(1)
        }
        async fn op2() -> AppResult<&'static str> {
            Ok("two")
        }

        let (a, b) = parallel::join2(op1(), op2()).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, "two");
    }

    #[tokio::test]
    async fn test_parallel_join2_propagates_error() {
        async fn ok() -> AppResult<()> {
            Ok(())
        }
        async fn fail() -> AppResult<()> {
            Err(AppError::Timeout)
        }

        assert!(matches!(
            parallel::join2(ok(), fail()).await,
            Err(AppError::Timeout)
        ));
    }
}

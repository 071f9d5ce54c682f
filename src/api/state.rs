//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DEFAULT_CORS_ORIGIN, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::infra::{HealthCheck, RateLimiter};
use crate::services::{
    AuthService, ConsultationService, MedicalService, SearchService, ServiceContainer,
};

/// HTTP-level settings applied when building the router
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cors_origins: config.cors_origins.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub consultation_service: Arc<dyn ConsultationService>,
    pub medical_service: Arc<dyn MedicalService>,
    pub search_service: Arc<dyn SearchService>,
    /// Redis-backed request counters
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// MongoDB and Redis probes for `/health`
    pub health: Arc<dyn HealthCheck>,
    pub http: HttpSettings,
}

impl AppState {
    /// Create application state from a service container.
    pub fn from_container(
        container: &dyn ServiceContainer,
        rate_limiter: Arc<dyn RateLimiter>,
        health: Arc<dyn HealthCheck>,
        http: HttpSettings,
    ) -> Self {
        Self {
            auth_service: container.auth(),
            consultation_service: container.consultations(),
            medical_service: container.medical(),
            search_service: container.search(),
            rate_limiter,
            health,
            http,
        }
    }
}

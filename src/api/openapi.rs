//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, health_handler, medical_handler, performance_handler, search_handler,
};
use crate::domain::{
    ConsultationMetrics, EntityAnalysis, HourlyMetrics, PeriodMetrics, RiskAssessment,
    UserResponse, UserRole, Visualization,
};
use crate::services::{
    ClosedConsultation, DailyBreakdown, ProcessedRecord, SearchRequest, SearchResponse,
    TokenResponse,
};

/// OpenAPI documentation for the Sperow API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sperow API",
        version = "0.1.0",
        description = "Clinical record assistant: document extraction, LLM summaries and consultation tracking",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5002", description = "Local development server")
    ),
    paths(
        health_handler::health_check,
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        // Medical record endpoints
        medical_handler::process_medical_record,
        medical_handler::close_consultation,
        medical_handler::metrics,
        medical_handler::chat_with_ai,
        medical_handler::analyze_entities,
        medical_handler::visualize,
        medical_handler::visualization_by_title,
        medical_handler::lab_results,
        medical_handler::test_names,
        medical_handler::clear_session,
        // Performance endpoints
        performance_handler::performance_stats,
        performance_handler::daily_performance,
        // Search
        search_handler::search,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            ConsultationMetrics,
            PeriodMetrics,
            HourlyMetrics,
            Visualization,
            RiskAssessment,
            EntityAnalysis,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            TokenResponse,
            // Medical record types
            ProcessedRecord,
            ClosedConsultation,
            DailyBreakdown,
            medical_handler::RecordUpload,
            medical_handler::ChatRequest,
            medical_handler::ChatResponse,
            medical_handler::VisualizationsResponse,
            medical_handler::LabResultsResponse,
            medical_handler::TestNamesResponse,
            medical_handler::SessionClearedResponse,
            // Search types
            SearchRequest,
            SearchResponse,
            // Health
            health_handler::HealthResponse,
            health_handler::ServiceStatus,
            health_handler::ServiceHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency status"),
        (name = "Authentication", description = "Doctor registration and login"),
        (name = "Medical Records", description = "Record upload, chat and derived views"),
        (name = "Consultations", description = "Consultation lifecycle and metrics"),
        (name = "Performance", description = "Weekly, monthly, yearly and hourly statistics"),
        (name = "Search", description = "Grounded web search")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! Persistence goes through the Unit of Work; session data, document
//! extraction and the language models through their client traits.

mod assistant_service;
mod auth_service;
pub mod container;
mod consultation_service;
mod medical_service;
pub mod prompts;
mod search_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use assistant_service::{extract_json, Assistant, AssistantService};
pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use consultation_service::{
    ClosedConsultation, ConsultationManager, ConsultationService, DailyBreakdown,
};
pub use medical_service::{MedicalRecords, MedicalService, ProcessedRecord};
pub use search_service::{SearchRequest, SearchResponse, SearchService, WebSearch};

// Parallel execution utilities
pub use container::parallel;

#[cfg(any(test, feature = "test-utils"))]
pub use assistant_service::MockAssistantService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use consultation_service::MockConsultationService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use medical_service::MockMedicalService;
#[cfg(any(test, feature = "test-utils"))]
pub use search_service::MockSearchService;

//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - MongoDB connection and repositories
//! - Redis cache and per-doctor session data
//! - S3/Textract, chat completion and Gemini clients
//! - Unit of Work for repository access

pub mod cache;
pub mod clients;
pub mod db;
pub mod health;
pub mod repositories;
pub mod session_store;
pub mod unit_of_work;

pub use cache::{Cache, RateLimiter};
pub use db::Database;
pub use health::{HealthCheck, Probes};
pub use repositories::{ConsultationRepository, ConsultationStore, UserRepository, UserStore};
pub use session_store::{RedisSessionStore, SessionStore};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockRateLimiter;
#[cfg(any(test, feature = "test-utils"))]
pub use health::MockHealthCheck;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockConsultationRepository, MockUserRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use session_store::MockSessionStore;
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockUnitOfWork;

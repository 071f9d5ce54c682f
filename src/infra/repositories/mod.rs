//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod consultation_repository;
pub(crate) mod entities;
mod user_repository;

pub use consultation_repository::{ConsultationRepository, ConsultationStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use consultation_repository::MockConsultationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

use mongodb::error::{ErrorKind, WriteFailure};

use crate::config::MONGO_DUPLICATE_KEY;

/// True when a write was rejected by a unique index.
pub(crate) fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == MONGO_DUPLICATE_KEY
    )
}

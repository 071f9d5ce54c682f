//! Unit of Work pattern implementation.
//!
//! Centralizes access to the repositories so services depend on one
//! trait object instead of a growing list of collections.

use std::sync::Arc;

use super::db::Database;
use super::repositories::{
    ConsultationRepository, ConsultationStore, UserRepository, UserStore,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Unit of Work trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get consultation repository
    fn consultations(&self) -> Arc<dyn ConsultationRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    user_repo: Arc<UserStore>,
    consultation_repo: Arc<ConsultationStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: &Database) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.users())),
            consultation_repo: Arc::new(ConsultationStore::new(db.consultations())),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn consultations(&self) -> Arc<dyn ConsultationRepository> {
        self.consultation_repo.clone()
    }
}

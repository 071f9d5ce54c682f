//! User repository backed by the `users` collection.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{bson::doc, Collection};

use super::entities::UserDocument;
use super::is_duplicate_key;
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Create a new doctor account.
    ///
    /// Returns `AppError::Conflict` when the username is taken.
    async fn create(&self, username: String, password_hash: String) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    collection: Collection<UserDocument>,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(collection: Collection<UserDocument>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = self
            .collection
            .find_one(doc! { "username": username })
            .await?;

        Ok(result.map(User::from))
    }

    async fn create(&self, username: String, password_hash: String) -> AppResult<User> {
        let mut document = UserDocument::new(username, password_hash, Utc::now());

        let inserted = self.collection.insert_one(&document).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::conflict("Username")
            } else {
                AppError::from(e)
            }
        })?;

        document.id = inserted.inserted_id.as_object_id();
        tracing::info!(username = %document.username, "User created");
        Ok(User::from(document))
    }
}

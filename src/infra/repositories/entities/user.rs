//! User document for the `users` collection.

use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{from_bson, to_bson};
use crate::domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Option<String>,
    pub created_at: bson::DateTime,
}

impl UserDocument {
    pub fn new(username: String, password_hash: String, created_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: None,
            username,
            password_hash,
            role: Some(UserRole::default().to_string()),
            created_at: to_bson(created_at),
        }
    }
}

/// Convert stored document to domain entity
impl From<UserDocument> for User {
    fn from(document: UserDocument) -> Self {
        User {
            id: document.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: document.username,
            password_hash: document.password_hash,
            role: document
                .role
                .as_deref()
                .map(UserRole::from)
                .unwrap_or_default(),
            created_at: from_bson(document.created_at),
        }
    }
}

//! Per-doctor session data kept in Redis for the length of a consultation.
//!
//! Key layout:
//! - `user:{username}:medical_record` - extracted record text
//! - `user:{username}:structured_summary` - JSON summary
//! - `cached_text:{file_name}` - extracted text reused in development

use async_trait::async_trait;
use serde_json::Value;

use super::cache::Cache;
use crate::config::{
    CACHE_PREFIX_CACHED_TEXT, CACHE_PREFIX_USER, SESSION_KEY_MEDICAL_RECORD,
    SESSION_KEY_STRUCTURED_SUMMARY, SESSION_TTL_SECONDS,
};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set_medical_record(&self, username: &str, text: &str) -> AppResult<()>;

    async fn get_medical_record(&self, username: &str) -> AppResult<Option<String>>;

    async fn set_structured_summary(&self, username: &str, summary: &Value) -> AppResult<()>;

    async fn get_structured_summary(&self, username: &str) -> AppResult<Option<Value>>;

    /// Remove every `user:{username}:*` key. Returns the number removed.
    async fn clear_user_data(&self, username: &str) -> AppResult<u64>;

    async fn set_cached_text(&self, file_name: &str, text: &str) -> AppResult<()>;

    async fn get_cached_text(&self, file_name: &str) -> AppResult<Option<String>>;
}

/// Build `user:{username}:{kind}`, refusing usernames that would escape
/// their own key space.
pub fn user_key(username: &str, kind: &str) -> AppResult<String> {
    if username.is_empty() || username.contains(':') {
        tracing::error!(username = %username, "Invalid username for session key");
        return Err(AppError::bad_request("Invalid username"));
    }
    Ok(format!("{}{}:{}", CACHE_PREFIX_USER, username, kind))
}

pub fn cached_text_key(file_name: &str) -> String {
    format!("{}{}", CACHE_PREFIX_CACHED_TEXT, file_name)
}

/// Redis-backed session store
pub struct RedisSessionStore {
    cache: Cache,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            ttl_seconds: SESSION_TTL_SECONDS,
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set_medical_record(&self, username: &str, text: &str) -> AppResult<()> {
        let key = user_key(username, SESSION_KEY_MEDICAL_RECORD)?;
        self.cache.set_string(&key, text, self.ttl_seconds).await?;
        tracing::info!(username = %username, "Stored medical record");
        Ok(())
    }

    async fn get_medical_record(&self, username: &str) -> AppResult<Option<String>> {
        let key = user_key(username, SESSION_KEY_MEDICAL_RECORD)?;
        self.cache.get_string(&key).await
    }

    async fn set_structured_summary(&self, username: &str, summary: &Value) -> AppResult<()> {
        let key = user_key(username, SESSION_KEY_STRUCTURED_SUMMARY)?;
        self.cache
            .set_with_ttl(&key, summary, self.ttl_seconds)
            .await?;
        tracing::info!(username = %username, "Stored structured summary");
        Ok(())
    }

    async fn get_structured_summary(&self, username: &str) -> AppResult<Option<Value>> {
        let key = user_key(username, SESSION_KEY_STRUCTURED_SUMMARY)?;
        self.cache.get(&key).await
    }

    async fn clear_user_data(&self, username: &str) -> AppResult<u64> {
        let pattern = user_key(username, "*")?;
        let removed = self.cache.delete_pattern(&pattern).await?;
        tracing::info!(username = %username, removed, "Cleared all session data");
        Ok(removed)
    }

    async fn set_cached_text(&self, file_name: &str, text: &str) -> AppResult<()> {
        self.cache
            .set_string(&cached_text_key(file_name), text, self.ttl_seconds)
            .await?;
        tracing::info!(file_name = %file_name, "Cached extracted text");
        Ok(())
    }

    async fn get_cached_text(&self, file_name: &str) -> AppResult<Option<String>> {
        self.cache.get_string(&cached_text_key(file_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keys() {
        assert_eq!(
            user_key("dr_house", SESSION_KEY_MEDICAL_RECORD).unwrap(),
            "user:dr_house:medical_record"
        );
        assert_eq!(
            user_key("dr_house", SESSION_KEY_STRUCTURED_SUMMARY).unwrap(),
            "user:dr_house:structured_summary"
        );
        assert_eq!(user_key("dr_house", "*").unwrap(), "user:dr_house:*");
    }

    #[test]
    fn test_user_key_rejects_injection() {
        assert!(user_key("dr:house", SESSION_KEY_MEDICAL_RECORD).is_err());
        assert!(user_key("", SESSION_KEY_MEDICAL_RECORD).is_err());
    }

    #[test]
    fn test_cached_text_key() {
        assert_eq!(cached_text_key("scan.pdf"), "cached_text:scan.pdf");
    }
}

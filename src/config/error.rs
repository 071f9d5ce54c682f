//! Configuration error types.

use thiserror::Error;

/// Configuration loading error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read template {path}: {reason}")]
    Template { path: String, reason: String },

    #[error("template {path} is missing keys: {missing}")]
    TemplateIncomplete { path: String, missing: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

//! Application configuration module
//!
//! Handles environment variables, the `.env` template and application-wide
//! constants.

mod constants;
mod error;
mod settings;
mod template;

pub use constants::*;
pub use error::ConfigError;
pub use settings::{AwsSettings, Config, Environment, LlmSettings};
pub use template::{check_template, TemplateReport};

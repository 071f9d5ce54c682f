//! Sperow API - Clinical record assistant for doctors
//!
//! Doctors upload a medical record; the text is extracted with AWS
//! Textract, summarized by a language model and cached per doctor while a
//! consultation is timed in MongoDB.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Consultations, metrics, summaries and users
//! - **services**: Application use cases and business logic
//! - **infra**: MongoDB, Redis, AWS and language model clients
//! - **api**: HTTP handlers, middleware, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Validate the environment and the shipped template
//! cargo run -- check-config --template .env.example
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Consultation, Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;

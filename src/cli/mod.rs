//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `check-config` - Validate the environment and `.env` template

pub mod args;

pub use args::{CheckConfigArgs, Cli, Commands, ServeArgs};

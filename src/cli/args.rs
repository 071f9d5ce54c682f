//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sperow API - Clinical record assistant server
#[derive(Parser, Debug)]
#[command(name = "sperow-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Validate the environment and optionally a `.env` template
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the serve command.
///
/// Unset flags fall back to `HOST` / `PORT` from the configuration.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the check-config command
#[derive(Parser, Debug, Default)]
pub struct CheckConfigArgs {
    /// Template file that must list every documented key
    #[arg(short, long)]
    pub template: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["sperow-api", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_config_with_template() {
        let cli =
            Cli::try_parse_from(["sperow-api", "-v", "check-config", "--template", ".env.example"])
                .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::CheckConfig(args) => {
                assert_eq!(args.template, Some(PathBuf::from(".env.example")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

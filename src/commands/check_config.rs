//! Check-config command - Validates configuration without starting anything.

use crate::cli::CheckConfigArgs;
use crate::config::{check_template, Config, ConfigError, TemplateReport};
use crate::errors::AppResult;

/// Execute the check-config command.
///
/// The environment has already been loaded by the caller; this reports it
/// (secrets redacted) and checks the template when one is given.
pub async fn execute(args: CheckConfigArgs, config: Config) -> AppResult<()> {
    println!("Configuration OK");
    println!("{:#?}", config);

    if let Some(path) = args.template {
        let report = check_template(&path)?;
        print_report(&report);
        ensure_complete(&report, &path.display().to_string())?;
        println!("Template {} lists every documented key", path.display());
    }

    Ok(())
}

fn print_report(report: &TemplateReport) {
    for key in &report.missing {
        println!("  missing: {}", key);
    }
    for key in &report.unknown {
        println!("  unknown: {}", key);
    }
}

fn ensure_complete(report: &TemplateReport, path: &str) -> Result<(), ConfigError> {
    if report.is_complete() {
        return Ok(());
    }
    Err(ConfigError::TemplateIncomplete {
        path: path.to_string(),
        missing: report.missing.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_template_is_an_error() {
        let report = TemplateReport {
            present: vec![],
            missing: vec!["SECRET_KEY".into(), "MONGODB_URI".into()],
            unknown: vec![],
        };

        let err = ensure_complete(&report, ".env.example").unwrap_err();
        assert!(matches!(err, ConfigError::TemplateIncomplete { .. }));
        assert_eq!(
            err.to_string(),
            "template .env.example is missing keys: SECRET_KEY, MONGODB_URI"
        );
        assert!(ensure_complete(&TemplateReport::default(), ".env").is_ok());
    }
}

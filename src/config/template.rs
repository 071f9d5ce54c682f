//! `.env` template verification.
//!
//! The repository ships `.env.example`; operators copy it to `.env` and fill
//! it in. [`check_template`] confirms a template parses as `KEY=value` lines
//! and lists every documented key.

use std::collections::BTreeSet;
use std::path::Path;

use super::constants::{OPTIONAL_KEYS, TEMPLATE_KEYS};
use super::error::ConfigError;

/// Result of checking a template file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TemplateReport {
    /// Documented keys found in the file
    pub present: Vec<String>,
    /// Documented keys absent from the file
    pub missing: Vec<String>,
    /// Keys in the file that the application never reads
    pub unknown: Vec<String>,
}

impl TemplateReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Parse a `.env`-style file and compare its keys with [`TEMPLATE_KEYS`].
pub fn check_template(path: impl AsRef<Path>) -> Result<TemplateReport, ConfigError> {
    let path = path.as_ref();
    let template_error = |reason: String| ConfigError::Template {
        path: path.display().to_string(),
        reason,
    };

    let entries = dotenvy::from_path_iter(path).map_err(|e| template_error(e.to_string()))?;

    let mut keys = BTreeSet::new();
    for entry in entries {
        let (key, _value) = entry.map_err(|e| template_error(e.to_string()))?;
        keys.insert(key);
    }

    Ok(compare_keys(&keys))
}

fn compare_keys(keys: &BTreeSet<String>) -> TemplateReport {
    let mut report = TemplateReport::default();

    for expected in TEMPLATE_KEYS {
        if keys.contains(*expected) {
            report.present.push(expected.to_string());
        } else {
            report.missing.push(expected.to_string());
        }
    }

    report.unknown = keys
        .iter()
        .filter(|k| !TEMPLATE_KEYS.contains(&k.as_str()) && !OPTIONAL_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_template(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_shipped_template_is_complete() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/.env.example");
        let report = check_template(path).unwrap();

        assert!(report.is_complete(), "missing: {:?}", report.missing);
        assert!(report.unknown.is_empty(), "unknown: {:?}", report.unknown);
    }

    #[test]
    fn test_reports_missing_and_unknown_keys() {
        let file = write_template(
            "# partial template\nFLASK_APP=app.py\nSECRET_KEY=\nSOMETHING_ELSE=1\n",
        );
        let report = check_template(file.path()).unwrap();

        assert_eq!(report.present, vec!["FLASK_APP", "SECRET_KEY"]);
        assert!(report.missing.contains(&"MONGODB_URI".to_string()));
        assert_eq!(report.unknown, vec!["SOMETHING_ELSE"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_optional_keys_are_not_unknown() {
        let file = write_template("REDIS_URL=redis://localhost:6379/0\nPORT=5002\n");
        let report = check_template(file.path()).unwrap();
        assert!(report.unknown.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = check_template("/definitely/not/here/.env");
        assert!(matches!(result, Err(ConfigError::Template { .. })));
    }
}

//! CLI command implementations.

pub mod classify;
pub mod schema;
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use pgpilot_core::PilotConfig;
use std::path::Path;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub read_only: bool,
}

/// Load `path` (or defaults if it does not exist) and apply `overrides`.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<PilotConfig> {
    let mut config = if path.exists() {
        PilotConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?
    } else {
        tracing::debug!(path = ?path, "No configuration file; using defaults");
        PilotConfig::default()
    };

    if let Some(url) = &overrides.database_url {
        config.database.database_url_env = None;
        config.database.database_url = Some(url.clone());
    }
    if overrides.read_only {
        config.guardrails.read_only = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml"), &Overrides::default()).unwrap();
        assert_eq!(config.guardrails.max_rows, 1000);
        assert!(!config.guardrails.read_only);
    }

    #[test]
    fn test_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  database_url_env: SOME_UNSET_VAR\n  database_url: postgres://file/db\nguardrails:\n  max_rows: 50"
        )
        .unwrap();

        let overrides = Overrides {
            database_url: Some("postgres://flag/db".to_string()),
            read_only: true,
        };
        let config = load_config(file.path(), &overrides).unwrap();

        assert_eq!(config.database.connection_string(), "postgres://flag/db");
        assert!(config.guardrails.read_only);
        assert_eq!(config.guardrails.max_rows, 50);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "guardrails:\n  max_rows: 0").unwrap();
        assert!(load_config(file.path(), &Overrides::default()).is_err());
    }
}

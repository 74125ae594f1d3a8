//! Configuration types for pgpilot.
//!
//! Configuration is read from a single YAML file (`pgpilot.yaml` by default).
//! Every section and field has a default, so an empty file, or no file at
//! all, yields a working configuration pointed at a local Postgres.
//!
//! ```yaml
//! database:
//!   database_url_env: DATABASE_URL
//!   schema: public
//! schema_cache:
//!   ttl_seconds: 300
//! guardrails:
//!   max_rows: 1000
//!   read_only: true
//! ```

pub mod database;
pub mod mcp;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub use database::{DatabaseConfig, PoolConfig};
pub use mcp::McpConfig;

/// Complete pgpilot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PilotConfig {
    /// Postgres connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema metadata cache settings.
    #[serde(default)]
    pub schema_cache: SchemaCacheConfig,

    /// Row caps and sampling limits.
    #[serde(default)]
    pub guardrails: GuardrailsConfig,

    /// MCP server settings.
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Schema cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCacheConfig {
    /// Maximum age of a cached schema snapshot before it is refetched.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl SchemaCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Guardrails applied by the tool handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// Row cap appended to read statements that carry no limit of their own.
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,

    /// Rows returned by `sample_data` when the caller does not ask for a count.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: u64,

    /// Upper bound on rows `sample_data` will return.
    #[serde(default = "default_max_sample_rows")]
    pub max_sample_rows: u64,

    /// Depth bound for JSON structure inference.
    #[serde(default = "default_structure_depth")]
    pub structure_depth: usize,

    /// Maximum distinct keys probed per JSON column.
    #[serde(default = "default_json_key_limit")]
    pub json_key_limit: u64,

    /// When set, the `execute` tool is not offered at all.
    #[serde(default)]
    pub read_only: bool,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            sample_rows: default_sample_rows(),
            max_sample_rows: default_max_sample_rows(),
            structure_depth: default_structure_depth(),
            json_key_limit: default_json_key_limit(),
            read_only: false,
        }
    }
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_max_rows() -> u64 {
    1000
}

fn default_sample_rows() -> u64 {
    5
}

fn default_max_sample_rows() -> u64 {
    100
}

fn default_structure_depth() -> usize {
    5
}

fn default_json_key_limit() -> u64 {
    50
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PilotConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the guardrails meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guardrails.max_rows == 0 {
            return Err(ConfigError::Config(
                "guardrails.max_rows must be greater than zero".to_string(),
            ));
        }
        if self.guardrails.max_sample_rows == 0 {
            return Err(ConfigError::Config(
                "guardrails.max_sample_rows must be greater than zero".to_string(),
            ));
        }
        if self.database.schema.is_empty() {
            return Err(ConfigError::Config("database.schema must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = PilotConfig::from_yaml("").unwrap();
        assert_eq!(config.schema_cache.ttl_seconds, 300);
        assert_eq!(config.guardrails.max_rows, 1000);
        assert_eq!(config.database.schema, "public");
        assert!(!config.guardrails.read_only);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
schema_cache:
  ttl_seconds: 60
guardrails:
  max_rows: 200
  read_only: true
"#;
        let config = PilotConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.schema_cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.guardrails.max_rows, 200);
        assert_eq!(config.guardrails.sample_rows, 5);
        assert!(config.guardrails.read_only);
        assert_eq!(config.mcp.server_name, "pgpilot");
    }

    #[test]
    fn test_zero_row_cap_rejected() {
        let err = PilotConfig::from_yaml("guardrails:\n  max_rows: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database:\n  database_url: postgresql://u@h:5432/d").unwrap();

        let config = PilotConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.connection_string(), "postgresql://u@h:5432/d");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PilotConfig::from_file("/definitely/not/here/pgpilot.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

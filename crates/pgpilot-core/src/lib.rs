//! Shared types for pgpilot.
//!
//! The only thing every crate agrees on is configuration, so that is all this
//! crate holds. See [`config::PilotConfig`].

pub mod config;

pub use config::{
    ConfigError, DatabaseConfig, GuardrailsConfig, McpConfig, PilotConfig, PoolConfig,
    SchemaCacheConfig,
};

//! MCP server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP server.
///
/// Only the stdio transport exists, so there is nothing to choose beyond the
/// name the server reports during `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Server name reported in `serverInfo`.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
        }
    }
}

fn default_server_name() -> String {
    "pgpilot".to_string()
}

//! # pgpilot-mcp
//!
//! MCP (Model Context Protocol) server exposing a Postgres database to AI
//! agents through a small, fixed set of tools.
//!
//! ## Tools
//!
//! | Tool | Read-only | Description |
//! |------|-----------|-------------|
//! | `query` | yes | SELECT / WITH / EXPLAIN, capped at `max_rows` when unlimited |
//! | `execute` | no | DML and DDL; DDL invalidates the schema cache |
//! | `list_tables` | yes | Table names from the schema cache |
//! | `describe_table` | yes | Columns and indexes of one table |
//! | `sample_data` | yes | A few rows plus JSON column shapes and keys |
//! | `search_schema` | yes | Substring search over table and column names |
//!
//! Database errors come back as tool results (`isError: true`) whose text has
//! been rewritten with "did you mean" suggestions where possible.
//!
//! ## Example Usage
//!
//! ```ignore
//! use pgpilot_assist::SchemaCache;
//! use pgpilot_mcp::{McpServer, ToolExecutor};
//!
//! let adapter = Arc::new(PgAdapter::connect(&config.database).await?);
//! let cache = Arc::new(SchemaCache::new(adapter.clone(), config.schema_cache.ttl()));
//! let executor = ToolExecutor::new(adapter, cache, config.guardrails.clone());
//!
//! McpServer::new(config.mcp.clone(), executor).run_stdio().await?;
//! ```

pub mod error;
pub mod executor;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use executor::{ExecutionResult, ToolExecutor, apply_row_cap};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, ToolContent, ToolDefinition};
pub use server::McpServer;
pub use tools::{TOOLSET_VERSION, ToolKind, ToolRegistry};

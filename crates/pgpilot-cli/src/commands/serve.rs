//! `pgpilot serve` - run the MCP server on stdio.

use anyhow::{Context, Result};
use pgpilot_adapter_pg::PgAdapter;
use pgpilot_assist::SchemaCache;
use pgpilot_core::PilotConfig;
use pgpilot_mcp::{McpServer, ToolExecutor};
use std::sync::Arc;

pub async fn run(config: PilotConfig) -> Result<()> {
    let adapter = Arc::new(
        PgAdapter::connect(&config.database)
            .await
            .context("Failed to connect to the database")?,
    );
    let cache = Arc::new(SchemaCache::new(adapter.clone(), config.schema_cache.ttl()));
    let executor = ToolExecutor::new(adapter, cache, config.guardrails.clone());
    let server = McpServer::new(config.mcp.clone(), executor);

    tracing::info!(
        read_only = config.guardrails.read_only,
        max_rows = config.guardrails.max_rows,
        cache_ttl_seconds = config.schema_cache.ttl_seconds,
        "pgpilot ready"
    );

    tokio::select! {
        result = server.run_stdio() => result.context("MCP server failed")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted; shutting down"),
    }
    Ok(())
}

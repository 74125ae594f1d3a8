//! `pgpilot schema` - fetch and print the schema snapshot.

use anyhow::{Context, Result};
use pgpilot_adapter_pg::PgAdapter;
use pgpilot_assist::{SchemaCache, SchemaSnapshot};
use pgpilot_core::PilotConfig;
use serde_json::{Value, json};

pub async fn run(config: &PilotConfig, as_json: bool) -> Result<()> {
    let adapter = PgAdapter::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    let cache = SchemaCache::new(adapter, config.schema_cache.ttl());
    let snapshot = cache
        .snapshot()
        .await
        .context("Failed to read the schema catalog")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&to_json(&config.database.schema, &snapshot))?);
    } else {
        println!("Schema {} ({} tables)", config.database.schema, snapshot.tables().len());
        for table in snapshot.tables() {
            println!("  {}", table);
            println!("    {}", snapshot.columns_of(table).join(", "));
        }
    }
    Ok(())
}

fn to_json(schema: &str, snapshot: &SchemaSnapshot) -> Value {
    let tables: Vec<Value> = snapshot
        .tables()
        .iter()
        .map(|t| json!({"name": t, "columns": snapshot.columns_of(t)}))
        .collect();
    json!({
        "schema": schema,
        "capturedAt": snapshot.captured_at().to_rfc3339(),
        "tables": tables,
    })
}

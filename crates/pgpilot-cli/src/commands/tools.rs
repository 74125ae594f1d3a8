//! `pgpilot tools` - print the tool definitions offered under the current guardrails.

use anyhow::Result;
use pgpilot_core::PilotConfig;
use pgpilot_mcp::{TOOLSET_VERSION, ToolRegistry};
use serde_json::json;

pub fn run(config: &PilotConfig) -> Result<()> {
    let registry = ToolRegistry::from_guardrails(&config.guardrails);
    let output = json!({
        "toolsetVersion": TOOLSET_VERSION,
        "tools": registry.list(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

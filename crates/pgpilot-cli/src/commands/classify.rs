//! `pgpilot classify` - offline statement classification.

use anyhow::Result;
use pgpilot_assist::classify;
use pgpilot_core::PilotConfig;
use pgpilot_mcp::apply_row_cap;
use serde_json::{Value, json};

pub fn report(config: &PilotConfig, sql: &str) -> Value {
    let classification = classify(sql);
    let (sent, cap) = apply_row_cap(sql, &classification, config.guardrails.max_rows);
    json!({
        "kind": classification.kind,
        "hasExplicitLimit": classification.has_explicit_limit,
        "isSchemaMutating": classification.is_schema_mutating,
        "rowCap": cap,
        "sql": sent,
    })
}

pub fn run(config: &PilotConfig, sql: &str) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report(config, sql))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_for_unlimited_select() {
        let report = report(&PilotConfig::default(), "select * from users");
        assert_eq!(report["kind"], "read");
        assert_eq!(report["rowCap"], 1000);
        assert_eq!(report["sql"], "select * from users\nLIMIT 1000");
    }

    #[test]
    fn test_report_for_explain() {
        let report = report(&PilotConfig::default(), "EXPLAIN SELECT * FROM big_table");
        assert_eq!(report["kind"], "explain");
        assert_eq!(report["rowCap"], Value::Null);
        assert_eq!(report["sql"], "EXPLAIN SELECT * FROM big_table");
    }
}

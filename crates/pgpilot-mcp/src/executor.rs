//! Tool execution.
//!
//! Each tool is a thin handler over the assistance layer: guards run first,
//! statements go to the [`StatementExecutor`], database errors are passed
//! through the [`ErrorEnhancer`] and schema questions are answered from the
//! [`SchemaCache`].

use crate::error::McpError;
use crate::protocol::ToolContent;
use crate::tools::ToolKind;
use pgpilot_assist::identifier::assert_safe_identifier;
use pgpilot_assist::similarity::{DEFAULT_LIMIT, DEFAULT_MAX_DISTANCE, rank_similar};
use pgpilot_assist::{
    AssistError, CatalogAccessor, ErrorEnhancer, QueryClassification, QueryOutput, SchemaCache,
    StatementExecutor, ensure_read_only, ensure_write_statement, infer_structure,
};
use pgpilot_core::GuardrailsConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

const DESCRIBE_COLUMNS_SQL: &str = r#"
select column_name::text as name,
       data_type::text as type,
       (is_nullable = 'YES') as nullable,
       column_default::text as "default"
from information_schema.columns
where table_schema = current_schema() and table_name = $1
order by ordinal_position
"#;

const DESCRIBE_INDEXES_SQL: &str = r#"
select indexname::text as name, indexdef as definition
from pg_indexes
where schemaname = current_schema() and tablename = $1
order by indexname
"#;

/// Result of a tool execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the execution was successful.
    pub success: bool,
    /// The result content.
    pub content: Vec<ToolContent>,
}

impl ExecutionResult {
    /// Create a successful result with JSON content.
    pub fn success_json(value: Value) -> Self {
        Self {
            success: true,
            content: vec![ToolContent::Json { json: value }],
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
        }
    }

    /// Text of the first text item, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Json { .. } => None,
        })
    }

    /// Payload of the first JSON item, if any.
    pub fn json(&self) -> Option<&Value> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Json { json } => Some(json),
            ToolContent::Text { .. } => None,
        })
    }
}

impl From<AssistError> for ExecutionResult {
    fn from(e: AssistError) -> Self {
        ExecutionResult::error(e.to_string())
    }
}

/// Statement text to send and the cap appended to it, if any.
///
/// Trailing semicolons and whitespace are stripped before the cap is added,
/// and the clause goes on its own line so a trailing line comment cannot
/// swallow it.
pub fn apply_row_cap<'a>(
    sql: &'a str,
    classification: &QueryClassification,
    max_rows: u64,
) -> (Cow<'a, str>, Option<u64>) {
    if !classification.needs_row_cap() {
        return (Cow::Borrowed(sql), None);
    }
    let body = sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    (Cow::Owned(format!("{body}\nLIMIT {max_rows}")), Some(max_rows))
}

#[derive(Debug, Deserialize)]
struct StatementArgs {
    sql: String,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TableArgs {
    table: String,
}

#[derive(Debug, Deserialize)]
struct SampleArgs {
    table: String,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    pattern: String,
}

fn parse_args<T: DeserializeOwned>(kind: ToolKind, arguments: Value) -> Result<T, McpError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| McpError::InvalidArguments {
        tool: kind.name().to_string(),
        reason: e.to_string(),
    })
}

/// Runs tool calls against the database collaborators.
pub struct ToolExecutor<E, C> {
    statements: E,
    cache: Arc<SchemaCache<C>>,
    enhancer: ErrorEnhancer<C>,
    guardrails: GuardrailsConfig,
}

impl<E, C> ToolExecutor<E, C>
where
    E: StatementExecutor,
    C: CatalogAccessor,
{
    pub fn new(statements: E, cache: Arc<SchemaCache<C>>, guardrails: GuardrailsConfig) -> Self {
        Self {
            enhancer: ErrorEnhancer::new(cache.clone()),
            statements,
            cache,
            guardrails,
        }
    }

    pub fn guardrails(&self) -> &GuardrailsConfig {
        &self.guardrails
    }

    /// Run one tool.
    ///
    /// `Err` is reserved for arguments that do not match the tool's input
    /// shape. Every other failure is an [`ExecutionResult`] with `success`
    /// unset.
    pub async fn call(&self, kind: ToolKind, arguments: Value) -> Result<ExecutionResult, McpError> {
        let started = Instant::now();
        let result = match kind {
            ToolKind::Query => self.query(parse_args(kind, arguments)?).await,
            ToolKind::Execute => self.execute(parse_args(kind, arguments)?).await,
            ToolKind::ListTables => self.list_tables().await,
            ToolKind::DescribeTable => self.describe_table(parse_args(kind, arguments)?).await,
            ToolKind::SampleData => self.sample_data(parse_args(kind, arguments)?).await,
            ToolKind::SearchSchema => self.search_schema(parse_args(kind, arguments)?).await,
        };

        tracing::info!(
            tool = kind.name(),
            success = result.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        Ok(result)
    }

    async fn query(&self, args: StatementArgs) -> ExecutionResult {
        let classification = match ensure_read_only(&args.sql) {
            Ok(c) => c,
            Err(e) => return e.into(),
        };
        let (sql, cap) = apply_row_cap(&args.sql, &classification, self.guardrails.max_rows);

        match self.statements.query(&sql, &args.params).await {
            Ok(output) => {
                let truncated = cap.is_some_and(|cap| output.row_count == cap);
                if truncated {
                    tracing::debug!(rows = output.row_count, "Result hit the row cap");
                }
                ExecutionResult::success_json(json!({
                    "rowCount": output.row_count,
                    "rows": output.rows,
                    "fields": output.fields,
                    "truncated": truncated,
                }))
            }
            Err(e) => self.database_error(e, &args.sql).await,
        }
    }

    async fn execute(&self, args: StatementArgs) -> ExecutionResult {
        if self.guardrails.read_only {
            return ExecutionResult::error("This server is read-only; statements that modify data are disabled");
        }
        let classification = match ensure_write_statement(&args.sql) {
            Ok(c) => c,
            Err(e) => return e.into(),
        };

        match self.statements.execute(&args.sql, &args.params).await {
            Ok(output) => {
                if classification.is_schema_mutating {
                    self.cache.invalidate();
                    tracing::info!(command = %output.command, "Schema changed; cache invalidated");
                }
                ExecutionResult::success_json(json!({
                    "command": output.command,
                    "rowCount": output.row_count,
                    "schemaChanged": classification.is_schema_mutating,
                }))
            }
            Err(e) => self.database_error(e, &args.sql).await,
        }
    }

    async fn list_tables(&self) -> ExecutionResult {
        match self.cache.snapshot().await {
            Ok(snapshot) => ExecutionResult::success_json(json!({
                "tables": snapshot.tables(),
                "count": snapshot.tables().len(),
                "capturedAt": snapshot.captured_at().to_rfc3339(),
            })),
            Err(e) => e.into(),
        }
    }

    async fn describe_table(&self, args: TableArgs) -> ExecutionResult {
        let table = match self.known_table(&args.table).await {
            Ok(table) => table,
            Err(result) => return result,
        };
        let params = [Value::String(table.clone())];

        let columns = match self.statements.query(DESCRIBE_COLUMNS_SQL, &params).await {
            Ok(output) => output.rows,
            Err(e) => return self.database_error(e, DESCRIBE_COLUMNS_SQL).await,
        };
        let indexes = match self.statements.query(DESCRIBE_INDEXES_SQL, &params).await {
            Ok(output) => output.rows,
            Err(e) => return self.database_error(e, DESCRIBE_INDEXES_SQL).await,
        };

        ExecutionResult::success_json(json!({
            "table": table,
            "columns": columns,
            "indexes": indexes,
        }))
    }

    async fn sample_data(&self, args: SampleArgs) -> ExecutionResult {
        let table = match self.known_table(&args.table).await {
            Ok(table) => table,
            Err(result) => return result,
        };
        let limit = args
            .limit
            .unwrap_or(self.guardrails.sample_rows)
            .min(self.guardrails.max_sample_rows)
            .max(1);

        let sql = format!("SELECT * FROM \"{}\" LIMIT {}", table, limit);
        let output = match self.statements.query(&sql, &[]).await {
            Ok(output) => output,
            Err(e) => return self.database_error(e, &sql).await,
        };

        let json_columns = self.describe_json_columns(&table, &output).await;

        ExecutionResult::success_json(json!({
            "table": table,
            "limit": limit,
            "rowCount": output.row_count,
            "rows": output.rows,
            "fields": output.fields,
            "jsonColumns": json_columns,
        }))
    }

    /// Shape and top-level keys of every column declared `json`/`jsonb`.
    async fn describe_json_columns(&self, table: &str, output: &QueryOutput) -> Map<String, Value> {
        let mut described = Map::new();
        for field in output.fields.iter().filter(|f| f.is_json()) {
            let sample = output
                .rows
                .iter()
                .filter_map(|row| row.get(&field.name))
                .find(|v| v.is_object() || v.is_array());
            let structure = sample
                .map(|v| infer_structure(v, self.guardrails.structure_depth).to_json())
                .unwrap_or(Value::Null);

            let keys = match assert_safe_identifier(&field.name, "column") {
                Ok(column) => self.probe_json_keys(table, column).await,
                Err(_) => {
                    tracing::debug!(column = %field.name, "Skipping key probe for column with unsafe name");
                    None
                }
            };

            described.insert(
                field.name.clone(),
                json!({
                    "type": field.type_name,
                    "structure": structure,
                    "keys": keys,
                }),
            );
        }
        described
    }

    /// Distinct top-level object keys of one JSON column, or `None` if the probe failed.
    async fn probe_json_keys(&self, table: &str, column: &str) -> Option<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT jsonb_object_keys(\"{column}\"::jsonb) AS key FROM \"{table}\" \
             WHERE jsonb_typeof(\"{column}\"::jsonb) = 'object' ORDER BY key LIMIT {}",
            self.guardrails.json_key_limit
        );
        match self.statements.query(&sql, &[]).await {
            Ok(output) => Some(
                output
                    .rows
                    .iter()
                    .filter_map(|row| row.get("key").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(table, column, error = %e, "JSON key probe failed");
                None
            }
        }
    }

    async fn search_schema(&self, args: SearchArgs) -> ExecutionResult {
        let pattern = args.pattern.trim();
        if pattern.is_empty() {
            return ExecutionResult::error("pattern must not be empty");
        }
        let snapshot = match self.cache.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return e.into(),
        };

        let needle = pattern.to_lowercase();
        let tables: Vec<&String> = snapshot
            .tables()
            .iter()
            .filter(|t| t.to_lowercase().contains(&needle))
            .collect();
        let columns: Vec<Value> = snapshot
            .columns()
            .iter()
            .filter(|c| c.column.to_lowercase().contains(&needle))
            .map(|c| json!({"table": c.table, "column": c.column}))
            .collect();

        let mut result = json!({
            "pattern": pattern,
            "tables": tables,
            "columns": columns,
        });
        if tables.is_empty() && columns.is_empty() {
            let mut names: Vec<&str> = snapshot.tables().iter().map(String::as_str).collect();
            names.extend(snapshot.distinct_column_names());
            result["suggestions"] = json!(rank_similar(pattern, &names, DEFAULT_MAX_DISTANCE, DEFAULT_LIMIT));
        }
        ExecutionResult::success_json(result)
    }

    /// Guard `name` and resolve it to a table in the snapshot.
    async fn known_table(&self, name: &str) -> Result<String, ExecutionResult> {
        let name = assert_safe_identifier(name, "table")?;
        let snapshot = self.cache.snapshot().await?;
        if let Some(table) = snapshot.find_table(name) {
            return Ok(table.to_string());
        }

        let suggestions = rank_similar(name, snapshot.tables(), DEFAULT_MAX_DISTANCE, DEFAULT_LIMIT);
        let mut message = format!("Table \"{name}\" does not exist.");
        if !suggestions.is_empty() {
            message.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
        }
        Err(ExecutionResult::error(message))
    }

    async fn database_error(&self, error: anyhow::Error, sql: &str) -> ExecutionResult {
        let message = error.to_string();
        tracing::warn!(error = %message, "Statement failed");
        ExecutionResult::error(self.enhancer.enhance(&message, sql).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgpilot_assist::classify;

    #[test]
    fn test_row_cap_appended_to_unlimited_select() {
        let c = classify("SELECT * FROM t;  ");
        let (sql, cap) = apply_row_cap("SELECT * FROM t;  ", &c, 1000);
        assert_eq!(sql, "SELECT * FROM t\nLIMIT 1000");
        assert_eq!(cap, Some(1000));
    }

    #[test]
    fn test_row_cap_skips_explain_and_limited() {
        for sql in ["EXPLAIN SELECT * FROM big_table", "select * from t limit 5"] {
            let (sent, cap) = apply_row_cap(sql, &classify(sql), 1000);
            assert_eq!(sent, sql);
            assert_eq!(cap, None);
        }
    }

    #[test]
    fn test_row_cap_survives_trailing_comment() {
        let sql = "select * from t -- all rows";
        let (sent, _) = apply_row_cap(sql, &classify(sql), 10);
        assert!(sent.ends_with("-- all rows\nLIMIT 10"));
    }

    #[test]
    fn test_parse_args_reports_tool() {
        let err = parse_args::<StatementArgs>(ToolKind::Query, json!({"params": []})).unwrap_err();
        assert!(matches!(&err, McpError::InvalidArguments { tool, .. } if tool == "query"));
        assert_eq!(err.code(), -32602);

        let args: StatementArgs = parse_args(ToolKind::Query, json!({"sql": "select 1"})).unwrap();
        assert!(args.params.is_empty());
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One column of one table, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Name and declared type of a result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// Database type name, lower-cased (e.g. `int4`, `jsonb`).
    #[serde(rename = "type")]
    pub type_name: String,
}

impl FieldInfo {
    /// True when the column was declared `json` or `jsonb`.
    pub fn is_json(&self) -> bool {
        matches!(self.type_name.as_str(), "json" | "jsonb")
    }
}

/// Result of a read statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOutput {
    pub row_count: u64,
    pub rows: Vec<Map<String, Value>>,
    pub fields: Vec<FieldInfo>,
}

/// Result of a write statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Command tag, e.g. `INSERT` or `CREATE`.
    pub command: String,
    pub row_count: u64,
}

/// Read access to schema metadata for the default schema.
#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    /// Base table names, in catalog order.
    async fn list_tables(&self) -> anyhow::Result<Vec<String>>;

    /// Every column of every base table.
    async fn list_columns(&self) -> anyhow::Result<Vec<ColumnRef>>;
}

/// Runs caller SQL with bound parameters.
///
/// Errors carry the driver's message text; callers hand that text to the
/// error enhancer.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run a read statement (inside a read-only transaction).
    ///
    /// `fields` describes the result columns even when no rows come back.
    async fn query(&self, sql: &str, params: &[Value]) -> anyhow::Result<QueryOutput>;

    /// Run a write or DDL statement.
    async fn execute(&self, sql: &str, params: &[Value]) -> anyhow::Result<CommandOutput>;
}

#[async_trait]
impl<T: CatalogAccessor + ?Sized> CatalogAccessor for Arc<T> {
    async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
        (**self).list_tables().await
    }

    async fn list_columns(&self) -> anyhow::Result<Vec<ColumnRef>> {
        (**self).list_columns().await
    }
}

#[async_trait]
impl<T: StatementExecutor + ?Sized> StatementExecutor for Arc<T> {
    async fn query(&self, sql: &str, params: &[Value]) -> anyhow::Result<QueryOutput> {
        (**self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> anyhow::Result<CommandOutput> {
        (**self).execute(sql, params).await
    }
}

use async_trait::async_trait;
use pgpilot_assist::identifier::assert_safe_identifier;
use pgpilot_assist::{CatalogAccessor, ColumnRef, CommandOutput, QueryOutput, StatementExecutor};
use pgpilot_core::DatabaseConfig;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Arguments, Executor, PgPool, Row};
use std::time::{Duration, Instant};

pub mod decode;
pub mod introspect;

fn args_add<T>(args: &mut PgArguments, v: T) -> anyhow::Result<()>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| anyhow::anyhow!(e))
}

/// Bind caller-supplied JSON values as `$1..$n`.
///
/// Scalars bind with their natural Postgres type; arrays and objects bind as
/// `jsonb`. Untyped nulls bind as text, so callers may need an explicit cast
/// (`$1::int`) when the target column is not textual.
pub fn bind_params(params: &[Value]) -> anyhow::Result<PgArguments> {
    let mut args = PgArguments::default();
    for (i, v) in params.iter().enumerate() {
        match v {
            Value::Null => args_add(&mut args, Option::<String>::None)?,
            Value::Bool(b) => args_add(&mut args, *b)?,
            Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    args_add(&mut args, int)?
                } else if let Some(f) = n.as_f64() {
                    args_add(&mut args, f)?
                } else {
                    return Err(anyhow::anyhow!("Parameter ${} is out of range: {}", i + 1, n));
                }
            }
            Value::String(s) => args_add(&mut args, s.clone())?,
            Value::Array(_) | Value::Object(_) => {
                args_add(&mut args, sqlx::types::Json(v.clone()))?
            }
        }
    }
    Ok(args)
}

/// Command tag reported for a write: the statement's first keyword, upper-cased.
pub fn command_tag(sql: &str) -> String {
    sql.trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}

/// Statements run on every new pooled connection.
fn session_statements(schema: &str, statement_timeout_ms: u64) -> anyhow::Result<Vec<String>> {
    let schema = assert_safe_identifier(schema, "schema")?;
    let mut statements = vec![format!("SET search_path TO \"{}\"", schema)];
    if statement_timeout_ms > 0 {
        statements.push(format!("SET statement_timeout = {}", statement_timeout_ms));
    }
    Ok(statements)
}

/// Surface the server's own message for database errors.
fn db_error(e: sqlx::Error) -> anyhow::Error {
    match e {
        sqlx::Error::Database(db) => anyhow::anyhow!("{}", db.message()),
        other => anyhow::Error::new(other),
    }
}

/// Postgres implementation of the catalog and statement collaborators.
///
/// Every pooled session has its `search_path` pinned to the configured schema,
/// so unqualified table names in tool SQL resolve against the cached catalog.
pub struct PgAdapter {
    pool: PgPool,
    schema: String,
}

impl PgAdapter {
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let statements = session_statements(&config.schema, config.statement_timeout_ms)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool.max_connections)
            .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout_seconds))
            .after_connect(move |conn, _meta| {
                let statements = statements.clone();
                Box::pin(async move {
                    for statement in &statements {
                        (&mut *conn).execute(statement.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(&config.connection_string())
            .await?;

        tracing::info!(
            schema = %config.schema,
            max_connections = config.pool.max_connections,
            statement_timeout_ms = config.statement_timeout_ms,
            "Connected to Postgres"
        );

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }
}

#[async_trait]
impl CatalogAccessor for PgAdapter {
    async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
        introspect::list_tables(&self.pool, &self.schema).await
    }

    async fn list_columns(&self) -> anyhow::Result<Vec<ColumnRef>> {
        introspect::list_columns(&self.pool, &self.schema).await
    }
}

#[async_trait]
impl StatementExecutor for PgAdapter {
    async fn query(&self, sql: &str, params: &[Value]) -> anyhow::Result<QueryOutput> {
        let args = bind_params(params)?;
        let started = Instant::now();
        tracing::debug!(sql, params = params.len(), "Running read statement");

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let rows = sqlx::query_with(sql, args)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;
        let fields = match rows.first() {
            Some(row) => decode::fields_of(row.columns()),
            None => {
                let described = (&mut *tx).describe(sql).await.map_err(db_error)?;
                decode::fields_of(described.columns())
            }
        };
        tx.rollback().await?;

        let output = decode::rows_to_output(&rows, fields);
        tracing::debug!(
            rows = output.row_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Read statement finished"
        );
        Ok(output)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> anyhow::Result<CommandOutput> {
        let args = bind_params(params)?;
        let started = Instant::now();
        tracing::debug!(sql, params = params.len(), "Running write statement");

        let result = sqlx::query_with(sql, args)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        let output = CommandOutput {
            command: command_tag(sql),
            row_count: result.rows_affected(),
        };
        tracing::debug!(
            command = %output.command,
            rows = output.row_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Write statement finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_tag() {
        assert_eq!(command_tag("insert into t values (1)"), "INSERT");
        assert_eq!(command_tag("  \n Create TABLE t (id int)"), "CREATE");
        assert_eq!(command_tag("drop table t;"), "DROP");
        assert_eq!(command_tag(""), "");
    }

    #[test]
    fn test_bind_params_accepts_every_json_kind() {
        let params = vec![
            json!(null),
            json!(true),
            json!(42),
            json!(1.5),
            json!("text"),
            json!([1, 2]),
            json!({"k": "v"}),
        ];
        let args = bind_params(&params).unwrap();
        assert_eq!(args.len(), params.len());
    }

    #[test]
    fn test_session_statements() {
        assert_eq!(
            session_statements("public", 30000).unwrap(),
            vec![
                "SET search_path TO \"public\"".to_string(),
                "SET statement_timeout = 30000".to_string(),
            ]
        );
        assert_eq!(session_statements("app", 0).unwrap().len(), 1);
        assert!(session_statements("public; drop schema x", 0).is_err());
    }
}

use pgpilot_assist::ColumnRef;
use sqlx::{PgPool, Row};

/// Base tables of one schema, ordered by name.
pub async fn list_tables(pool: &PgPool, schema: &str) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        select table_name
        from information_schema.tables
        where table_type = 'BASE TABLE'
          and table_schema = $1
        order by table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let tables: Vec<String> = rows
        .into_iter()
        .map(|r| r.get::<String, _>("table_name"))
        .collect();
    tracing::debug!(schema, tables = tables.len(), "Listed tables");
    Ok(tables)
}

/// Columns of every base table in one schema, by table then ordinal position.
pub async fn list_columns(pool: &PgPool, schema: &str) -> anyhow::Result<Vec<ColumnRef>> {
    let rows = sqlx::query(
        r#"
        select c.table_name, c.column_name
        from information_schema.columns c
        join information_schema.tables t
          on t.table_schema = c.table_schema
         and t.table_name = c.table_name
        where t.table_type = 'BASE TABLE'
          and c.table_schema = $1
        order by c.table_name, c.ordinal_position
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let columns: Vec<ColumnRef> = rows
        .into_iter()
        .map(|r| ColumnRef::new(r.get::<String, _>("table_name"), r.get::<String, _>("column_name")))
        .collect();
    tracing::debug!(schema, columns = columns.len(), "Listed columns");
    Ok(columns)
}

//! Row decoding by declared column type.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pgpilot_assist::{FieldInfo, QueryOutput};
use serde_json::{Map, Value};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo};

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

/// Field names and lower-cased type names of a result's columns.
pub fn fields_of(columns: &[PgColumn]) -> Vec<FieldInfo> {
    columns
        .iter()
        .map(|c| FieldInfo {
            name: c.name().to_string(),
            type_name: c.type_info().name().to_lowercase(),
        })
        .collect()
}

/// Decode one cell according to its declared type.
///
/// `numeric` is rendered as a string so no precision is lost. Types without a
/// dedicated mapping are read as text when possible, otherwise as null.
pub fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let value = match type_name {
        "int2" => get::<i16>(row, idx).map(Value::from),
        "int4" => get::<i32>(row, idx).map(Value::from),
        "int8" => get::<i64>(row, idx).map(Value::from),
        "float4" => get::<f32>(row, idx).map(|v| Value::from(f64::from(v))),
        "float8" => get::<f64>(row, idx).map(Value::from),
        "numeric" => get::<BigDecimal>(row, idx).map(|v| Value::String(v.to_string())),
        "bool" => get::<bool>(row, idx).map(Value::Bool),
        "json" | "jsonb" => get::<Value>(row, idx),
        "uuid" => get::<uuid::Uuid>(row, idx).map(|v| Value::String(v.to_string())),
        "timestamptz" => get::<DateTime<Utc>>(row, idx).map(|v| Value::String(v.to_rfc3339())),
        "timestamp" => get::<NaiveDateTime>(row, idx)
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "date" => get::<NaiveDate>(row, idx).map(|v| Value::String(v.to_string())),
        "time" => get::<NaiveTime>(row, idx).map(|v| Value::String(v.to_string())),
        _ => get::<String>(row, idx).map(Value::String),
    };
    value.unwrap_or(Value::Null)
}

pub fn row_to_map(row: &PgRow, fields: &[FieldInfo]) -> Map<String, Value> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, f)| (f.name.clone(), decode_value(row, idx, &f.type_name)))
        .collect()
}

pub fn rows_to_output(rows: &[PgRow], fields: Vec<FieldInfo>) -> QueryOutput {
    QueryOutput {
        row_count: rows.len() as u64,
        rows: rows.iter().map(|r| row_to_map(r, &fields)).collect(),
        fields,
    }
}

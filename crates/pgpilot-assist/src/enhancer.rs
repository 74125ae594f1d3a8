//! Turns "does not exist" database errors into suggestions.
//!
//! Two driver message shapes are recognized: unknown column and unknown
//! relation. Anything else passes through untouched. The owning table of an
//! unknown column is guessed from the first `FROM`/`UPDATE` clause of the
//! statement; that guess is a heuristic and may be wrong for joins or
//! subqueries.

use crate::adapter::CatalogAccessor;
use crate::schema_cache::{SchemaCache, SchemaSnapshot};
use crate::similarity::{DEFAULT_LIMIT, DEFAULT_MAX_DISTANCE, rank_similar};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Tables listed in a relation diagnosis before eliding the rest.
const TABLE_PREVIEW: usize = 20;

static COLUMN_OF_RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcolumn\s+"?([^"\s]+?)"?\s+of\s+relation\s+"?([^"\s]+?)"?\s+does\s+not\s+exist"#)
        .expect("valid regex")
});

static COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcolumn\s+"?([^"\s]+?)"?\s+does\s+not\s+exist"#).expect("valid regex")
});

static RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\brelation\s+"?([^"\s]+?)"?\s+does\s+not\s+exist"#).expect("valid regex")
});

static TABLE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:from|update)\s+(?:"?\w+"?\.)?"?([A-Za-z_]\w*)"?"#).expect("valid regex")
});

/// Best-effort guess at the table a statement reads from or updates.
pub fn table_from_sql(sql: &str) -> Option<&str> {
    TABLE_CLAUSE
        .captures(sql)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Rewrites database error messages using the cached schema.
pub struct ErrorEnhancer<C> {
    cache: Arc<SchemaCache<C>>,
}

impl<C: CatalogAccessor> ErrorEnhancer<C> {
    pub fn new(cache: Arc<SchemaCache<C>>) -> Self {
        Self { cache }
    }

    /// Return a more helpful version of `message`, or `message` itself.
    ///
    /// Never fails: if the message is not recognized or the schema cannot be
    /// loaded, the original text is returned.
    pub async fn enhance(&self, message: &str, sql: &str) -> String {
        let Some(failure) = Failure::parse(message, sql) else {
            return message.to_string();
        };
        match self.cache.snapshot().await {
            Ok(snapshot) => failure.diagnose(&snapshot).to_string(),
            Err(_) => message.to_string(),
        }
    }
}

/// A recognized error, before consulting the schema.
#[derive(Debug, PartialEq)]
enum Failure<'a> {
    UnknownColumn { column: &'a str, table_hint: Option<&'a str> },
    UnknownRelation { relation: &'a str },
}

impl<'a> Failure<'a> {
    fn parse(message: &'a str, sql: &'a str) -> Option<Self> {
        if let Some(c) = COLUMN_OF_RELATION.captures(message) {
            return Some(Failure::UnknownColumn {
                column: last_segment(c.get(1)?.as_str()),
                table_hint: Some(last_segment(c.get(2)?.as_str())),
            });
        }
        if let Some(c) = COLUMN.captures(message) {
            return Some(Failure::UnknownColumn {
                column: last_segment(c.get(1)?.as_str()),
                table_hint: table_from_sql(sql),
            });
        }
        if let Some(c) = RELATION.captures(message) {
            return Some(Failure::UnknownRelation {
                relation: last_segment(c.get(1)?.as_str()),
            });
        }
        None
    }

    fn diagnose(&self, snapshot: &SchemaSnapshot) -> Diagnosis {
        match *self {
            Failure::UnknownColumn { column, table_hint } => {
                let table = table_hint.and_then(|t| snapshot.find_table(t));
                let (suggestions, table_columns) = match table {
                    Some(table) => {
                        let columns = snapshot.columns_of(table);
                        let suggestions =
                            rank_similar(column, &columns, DEFAULT_MAX_DISTANCE, DEFAULT_LIMIT);
                        (suggestions, columns.into_iter().map(str::to_string).collect())
                    }
                    None => {
                        let columns = snapshot.distinct_column_names();
                        let suggestions =
                            rank_similar(column, &columns, DEFAULT_MAX_DISTANCE, DEFAULT_LIMIT);
                        (suggestions, Vec::new())
                    }
                };
                Diagnosis::UnknownColumn {
                    column: column.to_string(),
                    table: table.map(str::to_string),
                    suggestions,
                    table_columns,
                }
            }
            Failure::UnknownRelation { relation } => Diagnosis::UnknownRelation {
                relation: relation.to_string(),
                suggestions: rank_similar(
                    relation,
                    snapshot.tables(),
                    DEFAULT_MAX_DISTANCE,
                    DEFAULT_LIMIT,
                ),
                available: snapshot.tables().to_vec(),
            },
        }
    }
}

/// Drops any `schema.` or `alias.` qualifier.
fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[derive(Debug)]
enum Diagnosis {
    UnknownColumn {
        column: String,
        table: Option<String>,
        suggestions: Vec<String>,
        table_columns: Vec<String>,
    },
    UnknownRelation {
        relation: String,
        suggestions: Vec<String>,
        available: Vec<String>,
    },
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::UnknownColumn {
                column,
                table,
                suggestions,
                table_columns,
            } => {
                match table {
                    Some(table) => writeln!(f, "Column \"{column}\" does not exist in table \"{table}\".")?,
                    None => writeln!(f, "Column \"{column}\" does not exist.")?,
                }
                if suggestions.is_empty() {
                    write!(f, "No similar column names found.")?;
                } else {
                    write!(f, "Did you mean: {}?", suggestions.join(", "))?;
                }
                if let Some(table) = table {
                    write!(f, "\nAvailable columns in {table}: {}", table_columns.join(", "))?;
                }
                Ok(())
            }
            Diagnosis::UnknownRelation {
                relation,
                suggestions,
                available,
            } => {
                writeln!(f, "Table \"{relation}\" does not exist.")?;
                if suggestions.is_empty() {
                    writeln!(f, "No similar table names found.")?;
                } else {
                    writeln!(f, "Did you mean: {}?", suggestions.join(", "))?;
                }
                let shown = available.len().min(TABLE_PREVIEW);
                write!(f, "Available tables: {}", available[..shown].join(", "))?;
                if available.len() > shown {
                    write!(f, " (and {} more)", available.len() - shown)?;
                }
                Ok(())
            }
        }
    }
}

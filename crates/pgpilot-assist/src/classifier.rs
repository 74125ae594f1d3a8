//! Read/write classification of SQL text.
//!
//! Classification looks at the leading keyword only; it is not a parser.
//! The text that gets executed is always the caller's original string.

use crate::error::AssistError;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\blimit\b|\bfetch\s+(first|next)\b").expect("valid regex")
});

const SCHEMA_MUTATING: &[&str] = &["create", "alter", "drop", "truncate", "rename"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Read,
    Write,
    Explain,
}

impl QueryKind {
    fn label(&self) -> &'static str {
        match self {
            QueryKind::Read => "Read-only",
            QueryKind::Write => "Write",
            QueryKind::Explain => "EXPLAIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryClassification {
    pub kind: QueryKind,
    pub has_explicit_limit: bool,
    pub is_schema_mutating: bool,
}

impl QueryClassification {
    /// Whether a default row cap should be appended before execution.
    /// `EXPLAIN` is never capped.
    pub fn needs_row_cap(&self) -> bool {
        self.kind == QueryKind::Read && !self.has_explicit_limit
    }
}

pub fn classify(sql: &str) -> QueryClassification {
    let normalized = sql.trim().to_lowercase();
    let keyword = leading_keyword(&normalized);

    let kind = match keyword {
        "explain" => QueryKind::Explain,
        "select" | "with" => QueryKind::Read,
        _ => QueryKind::Write,
    };

    QueryClassification {
        kind,
        has_explicit_limit: LIMIT_CLAUSE.is_match(&normalized),
        is_schema_mutating: SCHEMA_MUTATING.contains(&keyword),
    }
}

/// Fails unless `sql` is a read or `EXPLAIN` statement.
pub fn ensure_read_only(sql: &str) -> Result<QueryClassification, AssistError> {
    let classification = classify(sql);
    match classification.kind {
        QueryKind::Read | QueryKind::Explain => Ok(classification),
        QueryKind::Write => Err(AssistError::InvalidQueryKind {
            expected: "execute",
            found: classification.kind.label(),
        }),
    }
}

/// Fails for `SELECT`, `WITH` and `EXPLAIN` text.
pub fn ensure_write_statement(sql: &str) -> Result<QueryClassification, AssistError> {
    let classification = classify(sql);
    match classification.kind {
        QueryKind::Write => Ok(classification),
        QueryKind::Read | QueryKind::Explain => Err(AssistError::InvalidQueryKind {
            expected: "query",
            found: classification.kind.label(),
        }),
    }
}

/// First word of already lower-cased text, skipping opening parentheses.
fn leading_keyword(normalized: &str) -> &str {
    let rest = normalized.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(classify("SELECT * FROM t").kind, QueryKind::Read);
        assert_eq!(classify("  with x as (select 1) select * from x").kind, QueryKind::Read);
        assert_eq!(classify("(select 1) union (select 2)").kind, QueryKind::Read);
        assert_eq!(classify(" insert into t values (1)").kind, QueryKind::Write);
        assert_eq!(classify("EXPLAIN SELECT * FROM big_table").kind, QueryKind::Explain);
        assert_eq!(classify("").kind, QueryKind::Write);
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert_eq!(classify("selection_view").kind, QueryKind::Write);
        assert_eq!(classify("explained").kind, QueryKind::Write);
    }

    #[test]
    fn test_explicit_limit() {
        assert!(classify("select * from t limit 5").has_explicit_limit);
        assert!(classify("SELECT * FROM t LIMIT\n10").has_explicit_limit);
        assert!(classify("select * from t fetch first 3 rows only").has_explicit_limit);
        assert!(!classify("select * from t").has_explicit_limit);
        assert!(!classify("select limited from t").has_explicit_limit);
    }

    #[test]
    fn test_schema_mutating() {
        for sql in ["DROP TABLE t", "create index i on t(x)", "Alter table t add c int", "truncate t", "rename x"] {
            assert!(classify(sql).is_schema_mutating, "{sql}");
        }
        assert!(!classify("insert into t values (1)").is_schema_mutating);
        assert!(!classify("select 'drop table t'").is_schema_mutating);
    }

    #[test]
    fn test_explain_is_never_capped() {
        let c = classify("EXPLAIN SELECT * FROM big_table");
        assert!(!c.has_explicit_limit);
        assert!(!c.needs_row_cap());
        assert!(classify("select * from big_table").needs_row_cap());
        assert!(!classify("select * from big_table limit 1").needs_row_cap());
    }

    #[test]
    fn test_ensure_read_only() {
        assert!(ensure_read_only("select 1").is_ok());
        assert!(ensure_read_only("explain select 1").is_ok());

        let err = ensure_read_only("delete from t").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Write statements are not accepted here; use the `execute` tool instead"
        );
    }

    #[test]
    fn test_ensure_write_statement() {
        assert!(ensure_write_statement("update t set x = 1").is_ok());
        for sql in ["select 1", "WITH a AS (SELECT 1) SELECT * FROM a", "explain delete from t"] {
            let err = ensure_write_statement(sql).unwrap_err();
            assert!(
                matches!(err, AssistError::InvalidQueryKind { expected: "query", .. }),
                "{sql}"
            );
        }
    }
}

//! Error types for the assistance layer.

use thiserror::Error;

/// Errors raised before or around a database round trip.
///
/// Guard failures (`InvalidIdentifier`, `InvalidQueryKind`) are always raised
/// before any SQL is sent.
#[derive(Debug, Error)]
pub enum AssistError {
    /// A caller-supplied name is not safe to splice into SQL.
    #[error("invalid {label}: {value:?} (expected letters, digits and underscores, not starting with a digit)")]
    InvalidIdentifier { label: String, value: String },

    /// The statement was sent to the wrong entry point.
    #[error("{found} statements are not accepted here; use the `{expected}` tool instead")]
    InvalidQueryKind {
        expected: &'static str,
        found: &'static str,
    },

    /// The catalog accessor failed while refreshing the schema snapshot.
    #[error(transparent)]
    SchemaFetch(anyhow::Error),
}

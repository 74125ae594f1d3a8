//! # pgpilot-assist
//!
//! Schema-aware assistance for SQL sent by AI agents to Postgres.
//!
//! The crate has no database driver dependency. It talks to the database
//! through two collaborator traits ([`CatalogAccessor`] and
//! [`StatementExecutor`]) implemented by `pgpilot-adapter-pg` and by test
//! fakes.
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`identifier`] | Rejects unsafe names before they are spliced into SQL |
//! | [`similarity`] | Levenshtein distance and "did you mean" ranking |
//! | [`schema_cache`] | TTL-bounded table/column snapshot with single-flight refresh |
//! | [`structure`] | Depth-bounded shape of a JSON value |
//! | [`classifier`] | Read / write / explain classification and entry-point guards |
//! | [`enhancer`] | Rewrites "does not exist" errors with suggestions |
//!
//! ```text
//!   tool handler
//!       │  classify / ensure_*          (fail fast, no round trip)
//!       ▼
//!   StatementExecutor ──error──► ErrorEnhancer ──► SchemaCache ──► CatalogAccessor
//! ```

pub mod adapter;
pub mod classifier;
pub mod enhancer;
pub mod error;
pub mod identifier;
pub mod schema_cache;
pub mod similarity;
pub mod structure;

pub use adapter::{CatalogAccessor, ColumnRef, CommandOutput, FieldInfo, QueryOutput, StatementExecutor};
pub use classifier::{QueryClassification, QueryKind, classify, ensure_read_only, ensure_write_statement};
pub use enhancer::ErrorEnhancer;
pub use error::AssistError;
pub use identifier::assert_safe_identifier;
pub use schema_cache::{SchemaCache, SchemaSnapshot};
pub use similarity::{SimilarityCandidate, edit_distance, rank_similar};
pub use structure::{StructureNode, infer_structure};

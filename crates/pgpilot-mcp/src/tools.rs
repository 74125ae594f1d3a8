//! The tool set and its registry.
//!
//! The set of tools is closed: [`ToolKind`] lists every tool this server can
//! offer and [`TOOLSET_VERSION`] changes whenever a tool is added, removed or
//! changes its input shape. The registry holds the subset offered under the
//! current guardrails.

use crate::protocol::{ToolAnnotations, ToolDefinition};
use pgpilot_core::GuardrailsConfig;
use serde_json::json;
use std::collections::HashMap;

/// Version of the tool set, reported in `serverInfo`.
pub const TOOLSET_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Query,
    Execute,
    ListTables,
    DescribeTable,
    SampleData,
    SearchSchema,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Query,
        ToolKind::Execute,
        ToolKind::ListTables,
        ToolKind::DescribeTable,
        ToolKind::SampleData,
        ToolKind::SearchSchema,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Query => "query",
            ToolKind::Execute => "execute",
            ToolKind::ListTables => "list_tables",
            ToolKind::DescribeTable => "describe_table",
            ToolKind::SampleData => "sample_data",
            ToolKind::SearchSchema => "search_schema",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn is_read_only(&self) -> bool {
        !matches!(self, ToolKind::Execute)
    }

    /// MCP definition, with limits taken from `guardrails`.
    pub fn definition(&self, guardrails: &GuardrailsConfig) -> ToolDefinition {
        let (description, input_schema) = match self {
            ToolKind::Query => (
                format!(
                    "Run a read-only SELECT, WITH or EXPLAIN statement. Statements without a LIMIT are capped at {} rows.",
                    guardrails.max_rows
                ),
                json!({
                    "type": "object",
                    "properties": {
                        "sql": {"type": "string", "description": "SQL text; use $1, $2, ... for values"},
                        "params": {"type": "array", "description": "Values bound to $1, $2, ..."}
                    },
                    "required": ["sql"]
                }),
            ),
            ToolKind::Execute => (
                "Run an INSERT, UPDATE, DELETE or DDL statement. Schema changes refresh the cached schema.".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "sql": {"type": "string", "description": "SQL text; use $1, $2, ... for values"},
                        "params": {"type": "array", "description": "Values bound to $1, $2, ..."}
                    },
                    "required": ["sql"]
                }),
            ),
            ToolKind::ListTables => (
                "List the tables of the database schema.".to_string(),
                json!({"type": "object", "properties": {}}),
            ),
            ToolKind::DescribeTable => (
                "Show the columns and indexes of a table.".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "table": {"type": "string", "description": "Table name"}
                    },
                    "required": ["table"]
                }),
            ),
            ToolKind::SampleData => (
                "Fetch a few rows of a table, with the shape and keys of any JSON columns.".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "table": {"type": "string", "description": "Table name"},
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": guardrails.max_sample_rows,
                            "default": guardrails.sample_rows
                        }
                    },
                    "required": ["table"]
                }),
            ),
            ToolKind::SearchSchema => (
                "Find tables and columns whose names contain a text fragment.".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "pattern": {"type": "string", "description": "Case-insensitive name fragment"}
                    },
                    "required": ["pattern"]
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: Some(description),
            input_schema,
            annotations: Some(ToolAnnotations {
                read_only: Some(self.is_read_only()),
                invalidates_schema: (*self == ToolKind::Execute).then_some(true),
            }),
        }
    }
}

/// Registry of offered tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, (ToolKind, ToolDefinition)>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool allowed by `guardrails`. `execute` is left out in read-only mode.
    pub fn from_guardrails(guardrails: &GuardrailsConfig) -> Self {
        let mut registry = Self::new();
        for kind in ToolKind::ALL {
            if guardrails.read_only && !kind.is_read_only() {
                continue;
            }
            registry.register(kind, kind.definition(guardrails));
        }
        registry
    }

    pub fn register(&mut self, kind: ToolKind, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), (kind, tool));
    }

    pub fn get(&self, name: &str) -> Option<(ToolKind, &ToolDefinition)> {
        self.tools.get(name).map(|(kind, tool)| (*kind, tool))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tools in [`ToolKind::ALL`] order.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        ToolKind::ALL
            .iter()
            .filter_map(|k| self.tools.get(k.name()).map(|(_, tool)| tool))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.list().iter().map(|t| t.name.as_str()).collect()
    }
}

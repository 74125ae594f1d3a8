//! Compact shape summaries for JSON column values.
//!
//! A shape is inferred from one sampled value. Arrays are described by their
//! first element only, so the result is a hint about the data, not a schema.

use serde_json::{Map, Value};

/// Default nesting bound for [`infer_structure`].
pub const DEFAULT_STRUCTURE_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }
}

/// Inferred shape of a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureNode {
    Null,
    Primitive(PrimitiveKind),
    /// An array with no elements to sample.
    EmptyArray,
    ArrayOf(Box<StructureNode>),
    /// Keys in the order they appear in the source document.
    ObjectOf(Vec<(String, StructureNode)>),
    /// The depth bound was reached.
    Truncated,
}

impl StructureNode {
    /// JSON rendering used in tool output.
    ///
    /// Leaves become type names (`"string"`, `"null"`), arrays become a
    /// one-element array of their element shape, objects keep their keys and
    /// truncation renders as `"..."`.
    pub fn to_json(&self) -> Value {
        match self {
            StructureNode::Null => Value::String("null".into()),
            StructureNode::Primitive(kind) => Value::String(kind.as_str().into()),
            StructureNode::EmptyArray => Value::Array(Vec::new()),
            StructureNode::ArrayOf(element) => Value::Array(vec![element.to_json()]),
            StructureNode::ObjectOf(fields) => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|(key, node)| (key.clone(), node.to_json()))
                    .collect();
                Value::Object(map)
            }
            StructureNode::Truncated => Value::String("...".into()),
        }
    }
}

/// Infer the shape of `value`, descending at most `max_depth` levels.
///
/// At the depth bound the result is [`StructureNode::Truncated`] whatever the
/// value is, so `max_depth == 0` always yields a truncation marker.
pub fn infer_structure(value: &Value, max_depth: usize) -> StructureNode {
    infer_at(value, max_depth, 0)
}

fn infer_at(value: &Value, max_depth: usize, depth: usize) -> StructureNode {
    if depth >= max_depth {
        return StructureNode::Truncated;
    }

    match value {
        Value::Null => StructureNode::Null,
        Value::Bool(_) => StructureNode::Primitive(PrimitiveKind::Boolean),
        Value::Number(_) => StructureNode::Primitive(PrimitiveKind::Number),
        Value::String(_) => StructureNode::Primitive(PrimitiveKind::String),
        Value::Array(items) => match items.first() {
            None => StructureNode::EmptyArray,
            Some(first) => StructureNode::ArrayOf(Box::new(infer_at(first, max_depth, depth + 1))),
        },
        Value::Object(map) => StructureNode::ObjectOf(
            map.iter()
                .map(|(key, v)| (key.clone(), infer_at(v, max_depth, depth + 1)))
                .collect(),
        ),
    }
}

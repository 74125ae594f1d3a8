//! Identifier validation.
//!
//! Values can be bound as parameters; identifiers cannot. Every table, column
//! or index name that reaches a SQL string through `format!` must pass
//! [`assert_safe_identifier`] first.

use crate::error::AssistError;

/// Returns `value` unchanged if it is a bare SQL identifier.
///
/// Rejects the empty string, whitespace, punctuation, quoting and qualified
/// names such as `schema.table`. `label` names the argument in the error.
pub fn assert_safe_identifier<'a>(value: &'a str, label: &str) -> Result<&'a str, AssistError> {
    if is_safe_identifier(value) {
        Ok(value)
    } else {
        Err(AssistError::InvalidIdentifier {
            label: label.to_string(),
            value: value.to_string(),
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, ASCII only.
pub fn is_safe_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

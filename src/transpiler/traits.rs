//! Dialect contract and shared quoting helpers.

use crate::ast::Value;
use crate::error::{WeaveError, WeaveResult};

use super::custom;

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "order",
    "group",
    "user",
    "table",
    "select",
    "from",
    "where",
    "join",
    "left",
    "right",
    "inner",
    "outer",
    "full",
    "cross",
    "natural",
    "on",
    "and",
    "or",
    "not",
    "null",
    "true",
    "false",
    "limit",
    "offset",
    "as",
    "in",
    "is",
    "like",
    "between",
    "having",
    "union",
    "all",
    "distinct",
    "case",
    "when",
    "then",
    "else",
    "end",
    "create",
    "alter",
    "drop",
    "insert",
    "update",
    "delete",
    "index",
    "key",
    "primary",
    "foreign",
    "references",
    "default",
    "constraint",
    "check",
];

/// Quote an identifier with `quote` if it is a reserved word or contains special chars.
/// Handles dotted identifiers (e.g., `table.column`) by quoting each part.
pub fn escape_identifier_with(name: &str, quote: char) -> String {
    if name.contains('.') {
        return name
            .split('.')
            .map(|part| escape_single_identifier(part, quote))
            .collect::<Vec<_>>()
            .join(".");
    }
    escape_single_identifier(name, quote)
}

/// Postgres-style escaping with double quotes.
pub fn escape_identifier(name: &str) -> String {
    escape_identifier_with(name, '"')
}

/// Escape a single identifier part (no dots).
fn escape_single_identifier(name: &str, quote: char) -> String {
    let lower = name.to_lowercase();
    let needs_escaping = RESERVED_WORDS.contains(&lower.as_str())
        || name.is_empty()
        || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
        || name.chars().next().map(|c| c.is_numeric()).unwrap_or(false);

    if needs_escaping {
        always_quote(name, quote)
    } else {
        name.to_string()
    }
}

/// Wrap in `quote`, doubling any embedded quote characters.
pub fn always_quote(name: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!("{q}{}{q}", name.replace(quote, &doubled), q = quote)
}

/// ANSI string literal: `'it''s'`.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Trait for dialect-specific SQL generation.
///
/// Built-in implementations live in [`super::sql`] and are selected through
/// [`super::Dialect`]; custom dialects implement this trait and are handed to
/// [`Query::with_generator`](crate::ast::Query::with_generator).
pub trait SqlGenerator: std::fmt::Debug {
    /// Short dialect name used in error messages.
    fn name(&self) -> &'static str;

    /// Quote an identifier (a single part, no dots).
    fn quote_identifier(&self, name: &str) -> String;

    /// Render a literal inline. Only used where parameters are not, e.g.
    /// multi-row INSERT.
    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => quote_string(s),
        }
    }

    /// Vendor spelling of an operator from the operator table, or `None`
    /// when the dialect cannot express it.
    fn operator_name(&self, op: &'static str) -> Option<&'static str> {
        Some(op)
    }

    /// Whether `ORDER BY x NULLS LAST` is understood natively.
    fn supports_nulls_last(&self) -> bool;

    /// Sort key that is 1 for NULL and 0 otherwise, used to emulate NULLS LAST.
    fn null_sort_key(&self, expr: &str) -> String {
        format!("ISNULL({})", expr)
    }

    /// Generate the parameter placeholder (e.g., $1, ?) for a 1-based index.
    fn placeholder(&self, index: usize) -> String;

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        sql
    }

    /// Build a vendor-custom operator from compiled operands. `None` means the
    /// dialect has no builder for `op`.
    fn custom_operator(&self, op: &str, operands: &[String]) -> Option<WeaveResult<String>> {
        match op {
            "CASE" => Some(custom::build_case(operands)),
            "ILIKE" => Some(custom::build_ilike_lower(operands)),
            _ => None,
        }
    }
}

/// Error for an operator the dialect refuses.
pub(crate) fn unsupported(op: &str, generator: &dyn SqlGenerator) -> WeaveError {
    WeaveError::Unsupported {
        op: op.to_string(),
        dialect: generator.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("name"), "name");
        assert_eq!(escape_identifier("user"), "\"user\"");
        assert_eq!(escape_identifier("order.id"), "\"order\".id");
        assert_eq!(escape_identifier("2fa"), "\"2fa\"");
        assert_eq!(escape_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_backtick_escaping() {
        assert_eq!(escape_identifier_with("group", '`'), "`group`");
        assert_eq!(escape_identifier_with("plain", '`'), "plain");
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("it's"), "'it''s'");
    }
}

//! Placeholder rewriting and binding.
//!
//! Compiled SQL names its parameters `:name` (or positional `?`). Drivers want
//! the dialect's own positional style, so [`Statement::prepare`] rewrites every
//! placeholder outside quoted text and remembers which name it stood for.

use crate::ast::Value;
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::{ParameterBag, SqlGenerator};

/// SQL in the dialect's placeholder style plus the values to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    names: Vec<String>,
    values: Vec<Value>,
}

impl Statement {
    /// Rewrite `:name` and `?` placeholders into `generator.placeholder(n)`.
    ///
    /// Text inside `'…'`, `"…"` and `` `…` `` is left untouched, as are `::`
    /// casts. A `?` stands for the parameter named by its 1-based position
    /// among the `?` marks.
    pub fn prepare(sql: &str, generator: &dyn SqlGenerator) -> Self {
        let chars: Vec<char> = sql.chars().collect();
        let mut out = String::with_capacity(sql.len());
        let mut names = Vec::new();
        let mut positional = 0;
        let mut quote: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = quote {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                }
                ':' if chars.get(i + 1) == Some(&':') => {
                    out.push_str("::");
                    i += 2;
                }
                ':' if chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                        end += 1;
                    }
                    names.push(chars[start..end].iter().collect());
                    out.push_str(&generator.placeholder(names.len()));
                    i = end;
                }
                '?' => {
                    positional += 1;
                    names.push(positional.to_string());
                    out.push_str(&generator.placeholder(names.len()));
                    i += 1;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Self {
            sql: out,
            names,
            values: Vec::new(),
        }
    }

    /// Resolve every placeholder from `params`, in placeholder order.
    pub fn bind(mut self, params: &ParameterBag) -> WeaveResult<Self> {
        self.values = self
            .names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| WeaveError::MissingParam(name.clone()))
            })
            .collect::<WeaveResult<Vec<_>>>()?;
        Ok(self)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameter name behind each placeholder, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Bound values, empty until [`Statement::bind`] succeeds.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Dialect;

    fn prepare(dialect: Dialect, sql: &str) -> Statement {
        Statement::prepare(sql, dialect.generator().as_ref())
    }

    #[test]
    fn test_named_to_positional() {
        let stmt = prepare(Dialect::Postgres, "SELECT * FROM users WHERE id = :id AND name = :p1");
        assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = $1 AND name = $2");
        assert_eq!(stmt.names(), ["id", "p1"]);

        let stmt = prepare(Dialect::MySQL, "SELECT * FROM users WHERE id = :id AND name = :p1");
        assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
    }

    #[test]
    fn test_repeated_name_binds_twice() {
        let stmt = prepare(Dialect::Postgres, "a = :x OR b = :x")
            .bind(&[("x", 7)].into_iter().collect())
            .unwrap();
        assert_eq!(stmt.sql(), "a = $1 OR b = $2");
        assert_eq!(stmt.values(), [Value::Int(7), Value::Int(7)]);
    }

    #[test]
    fn test_quotes_and_casts_are_skipped() {
        let stmt = prepare(
            Dialect::Postgres,
            "SELECT ':no', \"a:b\", x::text FROM t WHERE y = :yes",
        );
        assert_eq!(stmt.sql(), "SELECT ':no', \"a:b\", x::text FROM t WHERE y = $1");
        assert_eq!(stmt.names(), ["yes"]);
    }

    #[test]
    fn test_escaped_quote_stays_inside_literal() {
        let stmt = prepare(Dialect::SQLite, "SELECT 'it''s :x' WHERE a = :a");
        assert_eq!(stmt.sql(), "SELECT 'it''s :x' WHERE a = ?");
        assert_eq!(stmt.names(), ["a"]);
    }

    #[test]
    fn test_question_marks_bind_by_position() {
        let params: ParameterBag = [("1", Value::from("a")), ("2", Value::from(2))].into_iter().collect();
        let stmt = prepare(Dialect::Postgres, "a = ? AND b = ?").bind(&params).unwrap();
        assert_eq!(stmt.sql(), "a = $1 AND b = $2");
        assert_eq!(stmt.values(), [Value::from("a"), Value::Int(2)]);
    }

    #[test]
    fn test_missing_param() {
        let err = prepare(Dialect::Postgres, "a = :missing").bind(&ParameterBag::new()).unwrap_err();
        assert!(matches!(err, WeaveError::MissingParam(name) if name == "missing"));
    }
}

use crate::ast::Value;
use crate::transpiler::traits::{always_quote, quote_string, SqlGenerator};

/// SQLite Generator. Identifiers are always quoted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, id: &str) -> String {
        always_quote(id, '"')
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => quote_string(s),
        }
    }

    fn supports_nulls_last(&self) -> bool {
        // NULLS FIRST/LAST arrived in 3.30; older builds are still common.
        false
    }

    fn null_sort_key(&self, expr: &str) -> String {
        // ISNULL is a postfix operator here, not a function.
        if expr.contains(' ') {
            format!("({}) IS NULL", expr)
        } else {
            format!("{} IS NULL", expr)
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(n), Some(o)) => format!(" LIMIT {} OFFSET {}", n, o),
            (Some(n), None) => format!(" LIMIT {}", n),
            (None, Some(o)) => format!(" LIMIT -1 OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

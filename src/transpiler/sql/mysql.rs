use crate::ast::Value;
use crate::transpiler::traits::{escape_identifier_with, SqlGenerator};

/// MySQL Generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlGenerator;

impl SqlGenerator for MysqlGenerator {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier_with(name, '`')
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''")),
        }
    }

    fn operator_name(&self, op: &'static str) -> Option<&'static str> {
        match op {
            // `||` is logical OR unless PIPES_AS_CONCAT is set.
            "||" | "IS DISTINCT FROM" => None,
            other => Some(other),
        }
    }

    fn supports_nulls_last(&self) -> bool {
        false
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(n), Some(o)) => format!(" LIMIT {} OFFSET {}", n, o),
            (Some(n), None) => format!(" LIMIT {}", n),
            // MySQL has no OFFSET without LIMIT.
            (None, Some(o)) => format!(" LIMIT 18446744073709551615 OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

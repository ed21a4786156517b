use crate::error::WeaveResult;
use crate::transpiler::custom;
use crate::transpiler::escape_identifier;
use crate::transpiler::traits::SqlGenerator;

/// PostgreSQL Generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name)
    }

    fn operator_name(&self, op: &'static str) -> Option<&'static str> {
        match op {
            "REGEXP" => Some("~"),
            other => Some(other),
        }
    }

    fn supports_nulls_last(&self) -> bool {
        true
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn custom_operator(&self, op: &str, operands: &[String]) -> Option<WeaveResult<String>> {
        match op {
            "CASE" => Some(custom::build_case(operands)),
            "ILIKE" => Some(custom::build_ilike_native(operands)),
            _ => None,
        }
    }
}

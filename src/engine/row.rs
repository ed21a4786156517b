//! Fetched rows.

use serde::de::DeserializeOwned;

use crate::ast::Value;
use crate::error::{WeaveError, WeaveResult};

/// One result row: column names and values in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column. With duplicate names the first one wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.entry(column.clone()).or_insert_with(|| value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// Deserialize this row into `R` by column name.
    pub fn hydrate<R: DeserializeOwned>(&self) -> WeaveResult<R> {
        serde_json::from_value(self.to_json()).map_err(|e| WeaveError::Hydration(e.to_string()))
    }
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Metadata a typed record supplies to the compiler.
///
/// The attribute list drives wildcard SELECT expansion and column lists for
/// multi-row INSERT; hydration deserializes fetched rows with serde.
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct User { id: i64, name: String }
///
/// impl Record for User {
///     fn table_name() -> &'static str { "users" }
///     fn attribute_names() -> &'static [&'static str] { &["id", "name"] }
/// }
/// ```
pub trait Record: DeserializeOwned {
    fn table_name() -> &'static str;

    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }

    /// Column names in declaration order.
    fn attribute_names() -> &'static [&'static str];
}

/// Owned table metadata, built from a [`Record`] or by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMeta {
    pub name: String,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn of<R: Record>() -> Self {
        Self {
            name: R::table_name().to_string(),
            primary_key: R::primary_key().iter().map(|s| s.to_string()).collect(),
            attributes: R::attribute_names().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_attributes<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_primary_key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }
}

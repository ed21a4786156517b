//! # sqlweave
//!
//! A relational query compiler: describe a statement as a tree, get back
//! dialect-correct SQL with named placeholders and the parameter bag that
//! fills them.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlweave::prelude::*;
//!
//! let mut query = Query::new();
//! query
//!     .select(["id", "name"])
//!     .from("users")
//!     .filter(Expr::fields([("name", FieldValue::from("Dilbert")), ("active", FieldValue::Null)]))
//!     .limit(10);
//!
//! assert_eq!(
//!     query.sql().unwrap(),
//!     "SELECT id, name FROM users WHERE name = :p1 AND active IS NULL LIMIT 10"
//! );
//! ```
//!
//! ## Expressions
//!
//! | Form                     | Renders                                |
//! |--------------------------|----------------------------------------|
//! | `Expr::field("t.name")`  | `t.name`, quoted per dialect           |
//! | `Expr::lit(3)`           | `3`                                    |
//! | `Expr::lit("ann")`       | `:p1`, bound as a parameter            |
//! | `Expr::param("id")`      | `:id`                                  |
//! | `Expr::op("+", [...])`   | operands joined, parenthesized by rank |
//! | `Expr::func("lower", ..)`| `LOWER(...)`                           |
//! | `Expr::fields([...])`    | `a = :p1 AND b IS NULL AND c IN (...)` |

pub mod ast;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::WeaveConfig;
    pub use crate::engine::{Connection, Row, SqlxConnection, Statement};
    pub use crate::error::*;
    pub use crate::transpiler::{Compiled, Dialect, ParameterBag, SqlGenerator};
}

/// Parse a JSON query document.
///
/// ```
/// use sqlweave::transpiler::Dialect;
///
/// let query = sqlweave::parse(r#"{"from": "users", "where": {"id": 7}}"#, Dialect::SQLite).unwrap();
/// assert_eq!(query.sql().unwrap(), "SELECT * FROM \"users\" WHERE \"id\" = :p1");
/// ```
pub fn parse(document: &str, dialect: transpiler::Dialect) -> error::WeaveResult<ast::Query> {
    document::parse(document, dialect)
}

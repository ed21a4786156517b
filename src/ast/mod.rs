//! Query tree types.

pub mod expr;
pub mod operators;
pub mod query;
pub mod record;
pub mod values;

pub use expr::{Expr, FieldValue};
pub use operators::{Arity, OperatorSpec, LOOSEST};
pub use query::{
    Direction, InsertSource, JoinOn, JoinSpec, Nulls, OrderSpec, OrderTarget, Query, SelectItem,
    StatementKind, TableRef, TableSource,
};
pub use record::{Record, TableMeta};
pub use values::Value;

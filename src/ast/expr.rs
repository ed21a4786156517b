use crate::ast::{Query, Value};

/// A node of the query expression tree.
///
/// The variant is chosen when the tree is built, so the compiler never has to
/// guess whether a map means "field equality shorthand" or "operator list".
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value. Strings are bound as parameters unless they are already
    /// quoted (`'...'`), parenthesized (`(...)`) or a placeholder (`?`, `:name`).
    Literal(Value),
    /// Column reference, `name`, `table.name`, `name AS alias` or `name alias`.
    Field { name: String, alias: Option<String> },
    /// Named placeholder, rendered `:name`.
    Param(String),
    /// Operator application, looked up in the operator table.
    Op { op: String, operands: Vec<Expr> },
    /// Plain function call `NAME(arg, ...)`.
    Func { name: String, args: Vec<Expr> },
    /// Nested query, always rendered in parentheses.
    Subquery(Box<Query>),
    /// `{field: value, ...}` shorthand, an implicit AND of comparisons.
    Fields(Vec<(String, FieldValue)>),
}

/// Right-hand side of a shorthand field comparison.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// `field IS NULL`
    Null,
    /// `field = :pN`
    Value(Value),
    /// `field IN (:pN, ...)`, or `field IS NULL` when empty
    List(Vec<Value>),
    /// `field IN (SELECT ...)`
    Subquery(Box<Query>),
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field {
            name: name.into(),
            alias: None,
        }
    }

    pub fn field_as(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Expr::Field {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Param(name.into())
    }

    pub fn op(op: impl Into<String>, operands: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Op {
            op: op.into(),
            operands: operands.into_iter().collect(),
        }
    }

    pub fn func(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Func {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn subquery(query: Query) -> Self {
        Expr::Subquery(Box::new(query))
    }

    pub fn fields<K>(pairs: impl IntoIterator<Item = (K, FieldValue)>) -> Self
    where
        K: Into<String>,
    {
        Expr::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Self {
        Self::op("AND", operands)
    }

    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Self {
        Self::op("OR", operands)
    }

    pub fn not(operand: Expr) -> Self {
        Self::op("NOT", [operand])
    }

    /// `left OP right` for any binary operator.
    pub fn binary(op: &str, left: Expr, right: Expr) -> Self {
        Self::op(op, [left, right])
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary("=", left, right)
    }

    /// Explicit always-true condition, required to DELETE every row.
    pub fn truth() -> Self {
        Expr::Literal(Value::Bool(true))
    }

    /// Literal `TRUE`/`FALSE`, either as a value or as the nullary keyword.
    pub(crate) fn as_bool_constant(&self) -> Option<bool> {
        match self {
            Expr::Literal(Value::Bool(b)) => Some(*b),
            Expr::Op { op, operands } if operands.is_empty() => {
                if op.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else if op.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// A condition that states nothing: an empty shorthand map, or an `AND`
    /// whose operands are all empty.
    pub(crate) fn is_vacuous(&self) -> bool {
        match self {
            Expr::Fields(pairs) => pairs.is_empty(),
            Expr::Op { op, operands } if op.trim().eq_ignore_ascii_case("AND") => {
                operands.iter().all(Expr::is_vacuous)
            }
            _ => false,
        }
    }

    /// Queries nested anywhere in this expression, not descending into them.
    pub fn subqueries(&self) -> Vec<&Query> {
        let mut found = Vec::new();
        self.collect_subqueries(&mut found);
        found
    }

    fn collect_subqueries<'a>(&'a self, found: &mut Vec<&'a Query>) {
        match self {
            Expr::Op { operands: children, .. } | Expr::Func { args: children, .. } => {
                for child in children {
                    child.collect_subqueries(found);
                }
            }
            Expr::Subquery(query) => found.push(query.as_ref()),
            Expr::Fields(pairs) => {
                for (_, value) in pairs {
                    if let FieldValue::Subquery(query) = value {
                        found.push(query.as_ref());
                    }
                }
            }
            Expr::Literal(_) | Expr::Field { .. } | Expr::Param(_) => {}
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Field { name, alias: None } => write!(f, "{}", name),
            Expr::Field {
                name,
                alias: Some(a),
            } => write!(f, "{} AS {}", name, a),
            Expr::Param(name) => write!(f, ":{}", name),
            Expr::Op { op, operands } => {
                write!(f, "[\"{}\"", op)?;
                for operand in operands {
                    write!(f, ", {}", operand)?;
                }
                write!(f, "]")
            }
            Expr::Func { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Subquery(_) => write!(f, "(SUBQUERY)"),
            Expr::Fields(pairs) => {
                write!(f, "{{")?;
                for (i, (field, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Value(v) => write!(f, "{}", v),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            FieldValue::Subquery(_) => write!(f, "(SUBQUERY)"),
        }
    }
}

macro_rules! field_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    match Value::from(v) {
                        Value::Null => FieldValue::Null,
                        value => FieldValue::Value(value),
                    }
                }
            }
        )*
    };
}

field_value_from!(Value, bool, i32, i64, f64, &str, String, Option<&str>, Option<i64>);

impl From<Vec<Value>> for FieldValue {
    fn from(items: Vec<Value>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Query> for FieldValue {
    fn from(query: Query) -> Self {
        FieldValue::Subquery(Box::new(query))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

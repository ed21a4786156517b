//! Error types for sqlweave.

use thiserror::Error;

/// The main error type for sqlweave operations.
///
/// Build errors (everything up to [`WeaveError::Unsupported`]) are raised while
/// compiling a [`Query`](crate::ast::Query) and point at a programming error in
/// the caller's description. Retrying them never helps. The remaining variants
/// come from the connection and may be transient.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Operator name not present in the operator table.
    #[error("Unknown operator '{op}' in {expr}")]
    UnknownOperator { op: String, expr: String },

    /// Operand count does not satisfy the operator's arity class.
    #[error("Operator '{op}' expects {expected} operand(s), got {got} in {expr}")]
    Arity {
        op: String,
        expected: &'static str,
        got: usize,
        expr: String,
    },

    /// Field token with stray whitespace, unmatched quote or unmatched parenthesis.
    #[error("Malformed field '{0}'")]
    MalformedField(String),

    /// Literal that cannot be rendered (unbalanced verbatim text, non-finite float).
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Join type outside `CROSS | [NATURAL] (INNER | (LEFT|RIGHT|FULL) [OUTER])`.
    #[error("Invalid join type: '{0}'")]
    InvalidJoinType(String),

    /// ON condition missing for a conditional join, or present for CROSS/NATURAL.
    #[error("Join '{table}': {message}")]
    JoinCondition { table: String, message: &'static str },

    /// Two tables were given the same explicit alias.
    #[error("Duplicate table alias '{0}'")]
    DuplicateAlias(String),

    /// Multi-row insert row longer than the target field list.
    #[error("Insert row {row} has {len} values but only {expected} field(s) are targeted")]
    RowTooLong {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// The same parameter name bound to two different values.
    #[error("Parameter ':{0}' is bound to conflicting values")]
    ParamConflict(String),

    /// Statement is missing a required piece (table, assignments, filter...).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Operator exists but the dialect has no rendering for it.
    #[error("Operator '{op}' is not supported by the {dialect} dialect")]
    Unsupported { op: String, dialect: &'static str },

    /// No value in the parameter bag for a placeholder.
    #[error("No value bound for parameter ':{0}'")]
    MissingParam(String),

    /// Query has no connection attached.
    #[error("Query is not attached to a connection")]
    NotConnected,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// A fetch expecting a row found none.
    #[error("Query returned no rows")]
    RowNotFound,

    /// A row could not be converted into the requested record type.
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// Query document could not be understood.
    #[error("Document error: {0}")]
    Document(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WeaveError {
    /// Create an arity error for `op` rendered from `expr`.
    pub fn arity(op: &str, expected: &'static str, got: usize, expr: impl ToString) -> Self {
        Self::Arity {
            op: op.to_string(),
            expected,
            got,
            expr: expr.to_string(),
        }
    }

    /// Create an unknown-operator error.
    pub fn unknown_operator(op: &str, expr: impl ToString) -> Self {
        Self::UnknownOperator {
            op: op.to_string(),
            expr: expr.to_string(),
        }
    }

    /// Create an invalid-query error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// True for errors raised while compiling, before anything reached the database.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperator { .. }
                | Self::Arity { .. }
                | Self::MalformedField(_)
                | Self::InvalidValue(_)
                | Self::InvalidJoinType(_)
                | Self::JoinCondition { .. }
                | Self::DuplicateAlias(_)
                | Self::RowTooLong { .. }
                | Self::ParamConflict(_)
                | Self::InvalidQuery(_)
                | Self::Unsupported { .. }
        )
    }
}

/// Result type alias for sqlweave operations.
pub type WeaveResult<T> = Result<T, WeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WeaveError::arity("BETWEEN", "3", 2, "[\"BETWEEN\", age, 1]");
        assert_eq!(
            err.to_string(),
            "Operator 'BETWEEN' expects 3 operand(s), got 2 in [\"BETWEEN\", age, 1]"
        );
    }

    #[test]
    fn test_build_error_classification() {
        assert!(WeaveError::InvalidJoinType("SIDEWAYS".into()).is_build_error());
        assert!(!WeaveError::Database("deadlock detected".into()).is_build_error());
        assert!(!WeaveError::MissingParam("id".into()).is_build_error());
    }
}

//! The operator table.
//!
//! [`OPERATORS`] is ordered from the tightest-binding operator to the loosest.
//! An operator's precedence rank is its index in that slice; there is no
//! separate weight. Keep the order stable: the precedence test suite checks
//! every pair of binary operators against it.

use serde::Serialize;

/// Shape rule governing operand count and join syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arity {
    /// `CURRENT_TIMESTAMP`
    Nullary,
    /// `NOT expr`
    UnaryPrefix,
    /// `expr IS NULL`
    UnaryPostfix,
    /// `left OP right`
    BinaryFixed,
    /// `a OP b OP c ...` with identity folding
    Variadic,
    /// `a BETWEEN b AND c`
    Ternary,
    /// `left IN (a, b, ...)`
    InList,
    /// Rendered by the dialect (`CASE`, `ILIKE`)
    VendorCustom,
}

impl Arity {
    /// Human readable operand count, used in arity errors.
    pub fn expected(&self) -> &'static str {
        match self {
            Arity::Nullary => "0",
            Arity::UnaryPrefix | Arity::UnaryPostfix => "1",
            Arity::BinaryFixed => "2",
            Arity::Ternary => "3",
            Arity::InList => "at least 1",
            Arity::Variadic => "any number of",
            Arity::VendorCustom => "dialect-defined",
        }
    }

    /// Check an operand count. Variadic and custom operators validate elsewhere.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Nullary => count == 0,
            Arity::UnaryPrefix | Arity::UnaryPostfix => count == 1,
            Arity::BinaryFixed => count == 2,
            Arity::Ternary => count == 3,
            Arity::InList => count >= 1,
            Arity::Variadic | Arity::VendorCustom => true,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Arity::Nullary => "nullary",
            Arity::UnaryPrefix => "prefix",
            Arity::UnaryPostfix => "postfix",
            Arity::BinaryFixed => "binary",
            Arity::Variadic => "variadic",
            Arity::Ternary => "ternary",
            Arity::InList => "in-list",
            Arity::VendorCustom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// One row of the operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorSpec {
    pub name: &'static str,
    pub arity: Arity,
    /// Index in [`OPERATORS`]; lower binds tighter.
    pub rank: usize,
}

/// Canonical operator order, tightest first.
pub const OPERATORS: &[(&str, Arity)] = &[
    ("NULL", Arity::Nullary),
    ("TRUE", Arity::Nullary),
    ("FALSE", Arity::Nullary),
    ("CURRENT_TIMESTAMP", Arity::Nullary),
    ("CURRENT_DATE", Arity::Nullary),
    ("CURRENT_TIME", Arity::Nullary),
    ("INTERVAL", Arity::UnaryPrefix),
    ("~", Arity::UnaryPrefix),
    ("*", Arity::Variadic),
    ("/", Arity::BinaryFixed),
    ("%", Arity::BinaryFixed),
    ("+", Arity::Variadic),
    ("-", Arity::BinaryFixed),
    ("||", Arity::Variadic),
    ("<<", Arity::BinaryFixed),
    (">>", Arity::BinaryFixed),
    ("&", Arity::BinaryFixed),
    ("|", Arity::BinaryFixed),
    ("=", Arity::BinaryFixed),
    ("!=", Arity::BinaryFixed),
    ("<>", Arity::BinaryFixed),
    ("<", Arity::BinaryFixed),
    ("<=", Arity::BinaryFixed),
    (">", Arity::BinaryFixed),
    (">=", Arity::BinaryFixed),
    ("IS DISTINCT FROM", Arity::BinaryFixed),
    ("LIKE", Arity::BinaryFixed),
    ("NOT LIKE", Arity::BinaryFixed),
    ("ILIKE", Arity::VendorCustom),
    ("REGEXP", Arity::BinaryFixed),
    ("IN", Arity::InList),
    ("NOT IN", Arity::InList),
    ("BETWEEN", Arity::Ternary),
    ("NOT BETWEEN", Arity::Ternary),
    ("IS NULL", Arity::UnaryPostfix),
    ("IS NOT NULL", Arity::UnaryPostfix),
    ("IS TRUE", Arity::UnaryPostfix),
    ("IS FALSE", Arity::UnaryPostfix),
    ("NOT", Arity::UnaryPrefix),
    ("EXISTS", Arity::UnaryPrefix),
    ("NOT EXISTS", Arity::UnaryPrefix),
    ("AND", Arity::Variadic),
    ("OR", Arity::Variadic),
    ("CASE", Arity::VendorCustom),
];

/// Context rank for top-level fragments: nothing is ever looser.
pub const LOOSEST: usize = usize::MAX;

/// Look up an operator by name, ignoring case and surrounding whitespace.
pub fn lookup(name: &str) -> Option<OperatorSpec> {
    let wanted = normalize(name);
    OPERATORS
        .iter()
        .position(|(op, _)| *op == wanted)
        .map(|rank| OperatorSpec {
            name: OPERATORS[rank].0,
            arity: OPERATORS[rank].1,
            rank,
        })
}

pub fn arity_of(name: &str) -> Option<Arity> {
    lookup(name).map(|spec| spec.arity)
}

pub fn precedence_of(name: &str) -> Option<usize> {
    lookup(name).map(|spec| spec.rank)
}

/// Iterate the table in rank order.
pub fn all() -> impl Iterator<Item = OperatorSpec> {
    OPERATORS
        .iter()
        .enumerate()
        .map(|(rank, (name, arity))| OperatorSpec {
            name,
            arity: *arity,
            rank,
        })
}

/// Identity element of a variadic operator, emitted when it has no operands.
pub fn identity(name: &str) -> Option<&'static str> {
    match name {
        "AND" => Some("TRUE"),
        "OR" => Some("FALSE"),
        "+" => Some("0"),
        "*" => Some("1"),
        "||" => Some("''"),
        _ => None,
    }
}

/// First operator of each group SQL itself treats as one precedence level.
const TIER_HEADS: &[&str] = &["*", "+", "||", "<<", "=", "IN", "IS NULL", "NOT", "AND", "OR", "CASE"];

/// Rank of the first operator sharing SQL's precedence level with `rank`.
///
/// Right operands of binary operators are parenthesized from this rank on, so
/// `a - (b + c)` keeps its grouping even though `+` ranks tighter than `-`.
pub fn tier_start(rank: usize) -> usize {
    TIER_HEADS
        .iter()
        .filter_map(|head| precedence_of(head))
        .filter(|head| *head <= rank)
        .max()
        .unwrap_or(0)
}

/// Context rank for the left (or only) operand of an operator.
///
/// Comparisons and predicates (`=` through `IS FALSE`) count as one level
/// here, since engines order them differently: `(x = y) LIKE z` and
/// `(x = y) IS NULL` keep their parentheses. Elsewhere the operator's own
/// rank applies, so left-associative chains stay bare.
pub fn left_context(rank: usize) -> usize {
    match (precedence_of("="), precedence_of("IS FALSE")) {
        (Some(first), Some(last)) if (first..=last).contains(&rank) => first.saturating_sub(1),
        _ => rank,
    }
}

/// Uppercase and collapse inner whitespace: `is  not null` -> `IS NOT NULL`.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

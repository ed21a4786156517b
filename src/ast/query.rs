//! The mutable query description.
//!
//! A [`Query`] is filled in through `&mut self` mutators and compiled lazily.
//! Every mutator clears the cached SQL and any cached results, so reading
//! [`Query::sql`] twice without mutating in between is free and yields the
//! same text.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::ast::{Expr, Record, TableMeta, Value};
use crate::engine::{Connection, Row};
use crate::error::WeaveResult;
use crate::transpiler::{self, Compiled, Dialect, ParameterBag, SqlGenerator};

/// Statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::Select => write!(f, "SELECT"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// What a FROM entry reads from.
#[derive(Debug, Clone)]
pub enum TableSource {
    Table(String),
    Subquery(Box<Query>),
}

/// A FROM or JOIN target.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
    pub meta: Option<TableMeta>,
}

impl TableRef {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            source: TableSource::Table(name.into()),
            alias: None,
            meta: None,
        }
    }

    /// Table described by a record type, carrying its attribute metadata.
    pub fn record<R: Record>() -> Self {
        let meta = TableMeta::of::<R>();
        Self {
            source: TableSource::Table(meta.name.clone()),
            alias: None,
            meta: Some(meta),
        }
    }

    pub fn meta(meta: TableMeta) -> Self {
        Self {
            source: TableSource::Table(meta.name.clone()),
            alias: None,
            meta: Some(meta),
        }
    }

    pub fn subquery(query: Query) -> Self {
        Self {
            source: TableSource::Subquery(Box::new(query)),
            alias: None,
            meta: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Table name, or `None` for subqueries.
    pub fn name(&self) -> Option<&str> {
        match &self.source {
            TableSource::Table(name) => Some(name),
            TableSource::Subquery(_) => None,
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::table(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::table(name)
    }
}

impl From<TableMeta> for TableRef {
    fn from(meta: TableMeta) -> Self {
        TableRef::meta(meta)
    }
}

/// Join condition: a full expression or a `local: foreign` field map.
#[derive(Debug, Clone)]
pub enum JoinOn {
    Expr(Expr),
    Fields(Vec<(String, String)>),
}

impl From<Expr> for JoinOn {
    fn from(expr: Expr) -> Self {
        JoinOn::Expr(expr)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for JoinOn {
    fn from(pairs: Vec<(K, V)>) -> Self {
        JoinOn::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One JOIN clause. `kind` is validated against the join grammar at build time.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub table: TableRef,
    pub kind: String,
    pub on: Option<JoinOn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

/// One ORDER BY item.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

impl OrderSpec {
    pub fn asc(expr: impl Into<OrderTarget>) -> Self {
        Self {
            expr: expr.into().0,
            direction: Direction::Asc,
            nulls: None,
        }
    }

    pub fn desc(expr: impl Into<OrderTarget>) -> Self {
        Self {
            expr: expr.into().0,
            direction: Direction::Desc,
            nulls: None,
        }
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(Nulls::Last);
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(Nulls::First);
        self
    }

    /// Parse `field [ASC|DESC] [NULLS FIRST|LAST]`.
    pub fn parse(text: &str) -> WeaveResult<Self> {
        transpiler::fields::parse_order(text)
    }
}

/// Anything usable as an ORDER BY expression: a field name or an [`Expr`].
pub struct OrderTarget(Expr);

impl From<&str> for OrderTarget {
    fn from(name: &str) -> Self {
        OrderTarget(Expr::field(name))
    }
}

impl From<Expr> for OrderTarget {
    fn from(expr: Expr) -> Self {
        OrderTarget(expr)
    }
}

/// One select-list entry. Field aliases may also be written inline (`name AS n`).
#[derive(Debug, Clone)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// Row data for an INSERT.
#[derive(Debug, Clone)]
pub enum InsertSource {
    /// Single row, field => expression.
    Exprs(Vec<(String, Expr)>),
    /// Single row, field => literal; literals become bound parameters.
    Values(Vec<(String, Value)>),
    /// Multi-row literal VALUES list.
    Rows {
        fields: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// INSERT ... SELECT.
    Select {
        fields: Vec<String>,
        query: Box<Query>,
    },
}

/// A statement under construction.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) kind: StatementKind,
    pub(crate) distinct: bool,
    pub(crate) fields: Vec<SelectItem>,
    pub(crate) from: Vec<TableRef>,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) filter: Option<Expr>,
    pub(crate) groups: Vec<Expr>,
    pub(crate) having: Option<Expr>,
    pub(crate) orders: Vec<OrderSpec>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) insert: Option<InsertSource>,
    pub(crate) assignments: Vec<(String, Expr)>,
    pub(crate) params: ParameterBag,
    pub(crate) generator: Arc<dyn SqlGenerator>,
    pub(crate) connection: Option<Arc<dyn Connection>>,
    compiled: RefCell<Option<Compiled>>,
    pub(crate) results: RefCell<Option<Vec<Row>>>,
    pub(crate) affected: Cell<Option<u64>>,
}

impl Default for Query {
    fn default() -> Self {
        Self::with_dialect(Dialect::default())
    }
}

impl Query {
    /// Empty SELECT for the default dialect.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self::with_generator(dialect.generator())
    }

    /// Empty SELECT rendered by a custom dialect.
    pub fn with_generator(generator: Arc<dyn SqlGenerator>) -> Self {
        Self {
            kind: StatementKind::Select,
            distinct: false,
            fields: Vec::new(),
            from: Vec::new(),
            joins: Vec::new(),
            filter: None,
            groups: Vec::new(),
            having: None,
            orders: Vec::new(),
            limit: None,
            offset: None,
            insert: None,
            assignments: Vec::new(),
            params: ParameterBag::new(),
            generator,
            connection: None,
            compiled: RefCell::new(None),
            results: RefCell::new(None),
            affected: Cell::new(None),
        }
    }

    /// Empty SELECT bound to a connection, using the connection's dialect.
    pub fn on(connection: Arc<dyn Connection>) -> Self {
        let mut query = Self::with_generator(connection.generator());
        query.connection = Some(connection);
        query
    }

    /// Clear cached SQL and results. Called by every mutator.
    fn touch(&mut self) -> &mut Self {
        self.compiled.get_mut().take();
        self.results.get_mut().take();
        self.affected.set(None);
        self
    }

    // ------------------------------------------------------------------
    // Statement kind
    // ------------------------------------------------------------------

    /// SELECT the given fields (`name`, `t.name`, `name AS alias`).
    pub fn select<S: Into<String>>(&mut self, fields: impl IntoIterator<Item = S>) -> &mut Self {
        self.kind = StatementKind::Select;
        self.fields = fields
            .into_iter()
            .map(|f| SelectItem {
                expr: Expr::field(f),
                alias: None,
            })
            .collect();
        self.touch()
    }

    /// Append an arbitrary expression to the select list.
    pub fn select_expr(&mut self, expr: Expr, alias: Option<&str>) -> &mut Self {
        self.kind = StatementKind::Select;
        self.fields.push(SelectItem {
            expr,
            alias: alias.map(str::to_string),
        });
        self.touch()
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self.touch()
    }

    pub fn insert_into(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = StatementKind::Insert;
        self.from = vec![table.into()];
        self.touch()
    }

    pub fn update(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = StatementKind::Update;
        self.from = vec![table.into()];
        self.touch()
    }

    pub fn delete_from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = StatementKind::Delete;
        self.from = vec![table.into()];
        self.touch()
    }

    // ------------------------------------------------------------------
    // Clauses
    // ------------------------------------------------------------------

    /// Replace the FROM list with a single table.
    pub fn from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.from = vec![table.into()];
        self.touch()
    }

    /// Add another FROM table (`FROM a, b`).
    pub fn add_from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.from.push(table.into());
        self.touch()
    }

    pub fn from_record<R: Record>(&mut self) -> &mut Self {
        self.from(TableRef::record::<R>())
    }

    /// Add a JOIN. `kind` is e.g. `"LEFT"`, `"INNER"`, `"CROSS"`, `"NATURAL LEFT OUTER"`.
    pub fn join(
        &mut self,
        table: impl Into<TableRef>,
        kind: &str,
        on: Option<JoinOn>,
    ) -> &mut Self {
        self.joins.push(JoinSpec {
            table: table.into(),
            kind: kind.to_string(),
            on,
        });
        self.touch()
    }

    /// Join a record type under `alias`.
    pub fn join_record<R: Record>(&mut self, alias: &str, kind: &str, on: Option<JoinOn>) -> &mut Self {
        self.join(TableRef::record::<R>().alias(alias), kind, on)
    }

    /// Replace the WHERE condition.
    pub fn filter(&mut self, condition: Expr) -> &mut Self {
        self.filter = Some(condition);
        self.touch()
    }

    /// AND a condition onto the existing WHERE.
    pub fn and_filter(&mut self, condition: Expr) -> &mut Self {
        self.filter = Some(match self.filter.take() {
            None => condition,
            Some(Expr::Op { op, mut operands }) if op.eq_ignore_ascii_case("AND") => {
                operands.push(condition);
                Expr::Op { op, operands }
            }
            Some(existing) => Expr::and([existing, condition]),
        });
        self.touch()
    }

    pub fn group_by(&mut self, expr: impl Into<OrderTarget>) -> &mut Self {
        self.groups.push(expr.into().0);
        self.touch()
    }

    pub fn having(&mut self, condition: Expr) -> &mut Self {
        self.having = Some(condition);
        self.touch()
    }

    pub fn order_by(&mut self, order: OrderSpec) -> &mut Self {
        self.orders.push(order);
        self.touch()
    }

    /// Parse and append `field [ASC|DESC] [NULLS FIRST|LAST]`.
    pub fn order_by_str(&mut self, text: &str) -> WeaveResult<&mut Self> {
        let order = OrderSpec::parse(text)?;
        Ok(self.order_by(order))
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self.touch()
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self.touch()
    }

    /// UPDATE assignment `field = expr`.
    pub fn set(&mut self, field: impl Into<String>, value: Expr) -> &mut Self {
        self.assignments.push((field.into(), value));
        self.touch()
    }

    /// Single-row INSERT of literal values, bound as parameters.
    pub fn values<K: Into<String>, V: Into<Value>>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.insert = Some(InsertSource::Values(pairs));
        self.touch()
    }

    /// Single-row INSERT of expressions.
    pub fn value_exprs<K: Into<String>>(&mut self, pairs: impl IntoIterator<Item = (K, Expr)>) -> &mut Self {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.insert = Some(InsertSource::Exprs(pairs));
        self.touch()
    }

    /// Multi-row literal INSERT. An empty field list falls back to the table's attributes.
    pub fn rows<S: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> &mut Self {
        self.insert = Some(InsertSource::Rows {
            fields: fields.into_iter().map(Into::into).collect(),
            rows,
        });
        self.touch()
    }

    /// INSERT ... SELECT.
    pub fn insert_select<S: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = S>,
        query: Query,
    ) -> &mut Self {
        self.insert = Some(InsertSource::Select {
            fields: fields.into_iter().map(Into::into).collect(),
            query: Box::new(query),
        });
        self.touch()
    }

    /// Bind a user parameter referenced as `:name` (or `?` by 1-based index name).
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(name, value.into());
        self.touch()
    }

    pub fn dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.generator = dialect.generator();
        self.touch()
    }

    pub fn connect(&mut self, connection: Arc<dyn Connection>) -> &mut Self {
        self.generator = connection.generator();
        self.connection = Some(connection);
        self.touch()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn generator(&self) -> &dyn SqlGenerator {
        self.generator.as_ref()
    }

    pub fn tables(&self) -> &[TableRef] {
        &self.from
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn condition(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    /// User-bound parameters (before compilation adds generated ones).
    pub fn bound_params(&self) -> &ParameterBag {
        &self.params
    }

    /// Compile, or return the cached compilation.
    pub fn compile(&self) -> WeaveResult<Compiled> {
        if let Some(compiled) = self.compiled.borrow().as_ref() {
            return Ok(compiled.clone());
        }
        let compiled = transpiler::compile(self)?;
        *self.compiled.borrow_mut() = Some(compiled.clone());
        Ok(compiled)
    }

    pub fn sql(&self) -> WeaveResult<String> {
        Ok(self.compile()?.sql)
    }

    /// Merged parameter bag: user params plus generated ones.
    pub fn params(&self) -> WeaveResult<ParameterBag> {
        Ok(self.compile()?.params)
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.borrow().is_some()
    }

    /// Queries nested one level down: FROM and JOIN subqueries, INSERT ... SELECT,
    /// and subqueries inside any expression of this statement.
    pub fn subqueries(&self) -> Vec<&Query> {
        let mut found: Vec<&Query> = self
            .from
            .iter()
            .chain(self.joins.iter().map(|join| &join.table))
            .filter_map(|table| match &table.source {
                TableSource::Subquery(query) => Some(query.as_ref()),
                TableSource::Table(_) => None,
            })
            .collect();

        let mut exprs: Vec<&Expr> = self.fields.iter().map(|item| &item.expr).collect();
        exprs.extend(self.joins.iter().filter_map(|join| match &join.on {
            Some(JoinOn::Expr(expr)) => Some(expr),
            _ => None,
        }));
        exprs.extend(self.filter.iter());
        exprs.extend(self.groups.iter());
        exprs.extend(self.having.iter());
        exprs.extend(self.orders.iter().map(|order| &order.expr));
        exprs.extend(self.assignments.iter().map(|(_, expr)| expr));
        match &self.insert {
            Some(InsertSource::Exprs(pairs)) => exprs.extend(pairs.iter().map(|(_, expr)| expr)),
            Some(InsertSource::Select { query, .. }) => found.push(query.as_ref()),
            _ => {}
        }

        for expr in exprs {
            found.extend(expr.subqueries());
        }
        found
    }

    /// Clone of this query selecting `COUNT(*)`, keeping WHERE, JOIN and GROUP BY.
    ///
    /// A DISTINCT select is counted from the outside:
    /// `SELECT COUNT(*) FROM (SELECT DISTINCT ...) counted`.
    pub fn count_query(&self) -> Query {
        let mut counted = self.clone();
        counted.kind = StatementKind::Select;
        counted.orders.clear();
        counted.limit = None;
        counted.offset = None;
        counted.touch();

        let count_all = SelectItem {
            expr: Expr::func("COUNT", [Expr::field("*")]),
            alias: None,
        };
        if !self.distinct {
            counted.fields = vec![count_all];
            return counted;
        }

        let mut outer = Query::with_generator(self.generator.clone());
        outer.connection = self.connection.clone();
        outer.fields = vec![count_all];
        outer.from = vec![TableRef::subquery(counted).alias("counted")];
        outer
    }
}

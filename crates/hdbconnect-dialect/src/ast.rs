//! Portable statement tree accepted by the compiler.
//!
//! This is deliberately narrow: the shapes a host toolkit hands to a
//! dialect, not a general SQL AST. Builders consume and return `Self` so
//! trees read top-down in tests and host code:
//!
//! ```rust,ignore
//! use hdbconnect_dialect::ast::{Expr, Select};
//!
//! let query = Select::new([Expr::column("id")])
//!     .from("users")
//!     .filter(Expr::column("active").is_true())
//!     .limit(10);
//! ```

use serde::Serialize;

use crate::ident::Identifier;
use crate::types::{PortableType, Value};

// ═══════════════════════════════════════════════════════════════════════════
// Names
// ═══════════════════════════════════════════════════════════════════════════

/// Optionally schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    pub schema: Option<Identifier>,
    pub name: Identifier,
}

impl ObjectName {
    #[must_use]
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<Identifier>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl From<&str> for ObjectName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Identifier> for ObjectName {
    fn from(name: Identifier) -> Self {
        Self::new(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Like,
    NotLike,
    IsDistinctFrom,
    IsNotDistinctFrom,
}

/// Functions the dialect renders specially; anything else goes through
/// [`FunctionName::Named`] verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionName {
    /// Rendered as `CURRENT_TIMESTAMP`.
    Now,
    CurrentDate,
    CurrentTime,
    CurrentUser,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Coalesce,
    /// Dimension of a REAL_VECTOR.
    Cardinality,
    CosineSimilarity,
    L2Distance,
    ToRealVector,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: FunctionName,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        table: Option<Identifier>,
        name: Identifier,
    },
    /// `*` or `t.*`.
    Wildcard { table: Option<Identifier> },
    /// Value rendered inline.
    Literal {
        value: Value,
        ty: Option<PortableType>,
    },
    /// Value sent as a positional `?` parameter.
    Bind {
        value: Value,
        ty: Option<PortableType>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InQuery {
        expr: Box<Expr>,
        query: Box<Select>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Function(Function),
    Cast {
        expr: Box<Expr>,
        ty: PortableType,
    },
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// `seq.NEXTVAL`
    NextValue(ObjectName),
    Subquery(Box<Select>),
    Exists(Box<Select>),
    /// SQL text passed through untouched.
    Raw(String),
}

impl Expr {
    #[must_use]
    pub fn column(name: impl Into<Identifier>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn qualified(table: impl Into<Identifier>, name: impl Into<Identifier>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn star() -> Self {
        Self::Wildcard { table: None }
    }

    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
            ty: None,
        }
    }

    #[must_use]
    pub fn typed_lit(value: impl Into<Value>, ty: PortableType) -> Self {
        Self::Literal {
            value: value.into(),
            ty: Some(ty),
        }
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::Literal {
            value: Value::Null,
            ty: None,
        }
    }

    #[must_use]
    pub fn bind(value: impl Into<Value>) -> Self {
        Self::Bind {
            value: value.into(),
            ty: None,
        }
    }

    #[must_use]
    pub fn typed_bind(value: impl Into<Value>, ty: PortableType) -> Self {
        Self::Bind {
            value: value.into(),
            ty: Some(ty),
        }
    }

    #[must_use]
    pub fn func(name: FunctionName, args: impl IntoIterator<Item = Self>) -> Self {
        Self::Function(Function {
            name,
            args: args.into_iter().collect(),
            distinct: false,
        })
    }

    /// `now()`, rendered as `CURRENT_TIMESTAMP`.
    #[must_use]
    pub fn now() -> Self {
        Self::func(FunctionName::Now, [])
    }

    /// `COUNT(*)`
    #[must_use]
    pub fn count_star() -> Self {
        Self::func(FunctionName::Count, [])
    }

    #[must_use]
    pub fn next_value(sequence: impl Into<ObjectName>) -> Self {
        Self::NextValue(sequence.into())
    }

    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    #[must_use]
    pub fn cast(self, ty: PortableType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            ty,
        }
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self::Unary {
            op,
            operand: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        self.unary(UnaryOp::Not)
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        self.unary(UnaryOp::IsNull)
    }

    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.unary(UnaryOp::IsNotNull)
    }

    #[must_use]
    pub fn is_true(self) -> Self {
        self.unary(UnaryOp::IsTrue)
    }

    #[must_use]
    pub fn is_false(self) -> Self {
        self.unary(UnaryOp::IsFalse)
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    #[must_use]
    pub fn not_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    #[must_use]
    pub fn lt(self, right: Self) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    #[must_use]
    pub fn gt(self, right: Self) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    #[must_use]
    pub fn lt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    #[must_use]
    pub fn gt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    #[must_use]
    pub fn like(self, pattern: Self) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    #[must_use]
    pub fn op(self, op: BinaryOp, right: Self) -> Self {
        self.binary(op, right)
    }

    #[must_use]
    pub fn is_distinct_from(self, right: Self) -> Self {
        self.binary(BinaryOp::IsDistinctFrom, right)
    }

    #[must_use]
    pub fn is_not_distinct_from(self, right: Self) -> Self {
        self.binary(BinaryOp::IsNotDistinctFrom, right)
    }

    /// Conjunction; flattens nested `And`.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        match self {
            Self::And(mut items) => {
                items.push(right);
                Self::And(items)
            }
            left => Self::And(vec![left, right]),
        }
    }

    /// Disjunction; flattens nested `Or`.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        match self {
            Self::Or(mut items) => {
                items.push(right);
                Self::Or(items)
            }
            left => Self::Or(vec![left, right]),
        }
    }

    #[must_use]
    pub fn in_list(self, list: impl IntoIterator<Item = Self>) -> Self {
        Self::InList {
            expr: Box::new(self),
            list: list.into_iter().collect(),
            negated: false,
        }
    }

    #[must_use]
    pub fn not_in_list(self, list: impl IntoIterator<Item = Self>) -> Self {
        Self::InList {
            expr: Box::new(self),
            list: list.into_iter().collect(),
            negated: true,
        }
    }

    #[must_use]
    pub fn between(self, low: Self, high: Self) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SELECT
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<Identifier>,
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Table {
        name: ObjectName,
        alias: Option<Identifier>,
    },
    Subquery {
        query: Box<Select>,
        alias: Identifier,
    },
    Join {
        left: Box<FromItem>,
        right: Box<FromItem>,
        kind: JoinKind,
        on: Option<Expr>,
    },
}

impl FromItem {
    #[must_use]
    pub fn table(name: impl Into<ObjectName>) -> Self {
        Self::Table {
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(name: impl Into<ObjectName>, alias: impl Into<Identifier>) -> Self {
        Self::Table {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    #[must_use]
    pub fn join(self, kind: JoinKind, right: impl Into<Self>, on: Option<Expr>) -> Self {
        Self::Join {
            left: Box::new(self),
            right: Box::new(right.into()),
            kind,
            on,
        }
    }
}

impl From<&str> for FromItem {
    fn from(name: &str) -> Self {
        Self::table(name)
    }
}

impl From<ObjectName> for FromItem {
    fn from(name: ObjectName) -> Self {
        Self::table(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub descending: bool,
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
            nulls: None,
        }
    }
}

/// LIMIT / OFFSET operand. Only plain counts can be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum RowBound {
    Count(u64),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `FOR SHARE LOCK`
    Read,
    /// `FOR UPDATE`
    Update,
}

/// Row locking requested for a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct LockClause {
    pub mode: LockMode,
    pub of: Vec<Expr>,
    pub nowait: bool,
    pub skip_locked: bool,
}

impl LockClause {
    #[must_use]
    pub const fn read() -> Self {
        Self {
            mode: LockMode::Read,
            of: Vec::new(),
            nowait: false,
            skip_locked: false,
        }
    }

    #[must_use]
    pub const fn update() -> Self {
        Self {
            mode: LockMode::Update,
            of: Vec::new(),
            nowait: false,
            skip_locked: false,
        }
    }

    #[must_use]
    pub fn of(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.of = columns.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn nowait(mut self) -> Self {
        self.nowait = true;
        self
    }

    #[must_use]
    pub const fn skip_locked(mut self) -> Self {
        self.skip_locked = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,
    pub columns: Vec<SelectItem>,
    pub from: Vec<FromItem>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<RowBound>,
    pub offset: Option<RowBound>,
    pub lock: Option<LockClause>,
}

impl Select {
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = Expr>) -> Self {
        Self {
            columns: columns.into_iter().map(SelectItem::from).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column_as(mut self, expr: Expr, alias: impl Into<Identifier>) -> Self {
        self.columns.push(SelectItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn from(mut self, item: impl Into<FromItem>) -> Self {
        self.from.push(item.into());
        self
    }

    /// Add a WHERE predicate; repeated calls are AND-ed.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    #[must_use]
    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    #[must_use]
    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(predicate);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    #[must_use]
    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(RowBound::Count(count));
        self
    }

    #[must_use]
    pub fn offset(mut self, count: u64) -> Self {
        self.offset = Some(RowBound::Count(count));
        self
    }

    #[must_use]
    pub fn with_lock(mut self, lock: LockClause) -> Self {
        self.lock = Some(lock);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DML
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Expr>),
    Query(Box<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: ObjectName,
    pub columns: Vec<Identifier>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: ObjectName,
    pub assignments: Vec<(Identifier, Expr)>,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: ObjectName,
    pub filter: Option<Expr>,
}

/// How an UPSERT decides between insert and update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertMode {
    /// `WHERE <filter>`: rows matching the filter are updated.
    Where(Expr),
    /// `WITH PRIMARY KEY`
    PrimaryKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub table: ObjectName,
    pub columns: Vec<Identifier>,
    pub source: InsertSource,
    pub mode: UpsertMode,
}

// ═══════════════════════════════════════════════════════════════════════════
// DDL
// ═══════════════════════════════════════════════════════════════════════════

/// Storage prefix rendered between CREATE and TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableType {
    Column,
    Row,
    GlobalTemporary,
    GlobalTemporaryColumn,
    LocalTemporary,
    LocalTemporaryColumn,
    /// Any other prefix, upper-cased on output.
    Other(String),
}

impl TableType {
    #[must_use]
    pub fn as_sql(&self) -> String {
        match self {
            Self::Column => "COLUMN".to_string(),
            Self::Row => "ROW".to_string(),
            Self::GlobalTemporary => "GLOBAL TEMPORARY".to_string(),
            Self::GlobalTemporaryColumn => "GLOBAL TEMPORARY COLUMN".to_string(),
            Self::LocalTemporary => "LOCAL TEMPORARY".to_string(),
            Self::LocalTemporaryColumn => "LOCAL TEMPORARY COLUMN".to_string(),
            Self::Other(prefix) => prefix.to_uppercase(),
        }
    }
}

impl std::str::FromStr for TableType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', " ").to_uppercase();
        Ok(match normalized.as_str() {
            "COLUMN" => Self::Column,
            "ROW" => Self::Row,
            "GLOBAL TEMPORARY" => Self::GlobalTemporary,
            "GLOBAL TEMPORARY COLUMN" => Self::GlobalTemporaryColumn,
            "LOCAL TEMPORARY" => Self::LocalTemporary,
            "LOCAL TEMPORARY COLUMN" => Self::LocalTemporaryColumn,
            _ => Self::Other(s.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `GENERATED ALWAYS` instead of `GENERATED BY DEFAULT`.
    pub always: bool,
    pub start: Option<i64>,
    pub increment: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Identifier,
    pub ty: PortableType,
    pub nullable: bool,
    pub default: Option<Expr>,
    pub identity: Option<Identity>,
    pub comment: Option<String>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<Identifier>, ty: PortableType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
            default: None,
            identity: None,
            comment: None,
        }
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, expr: Expr) -> Self {
        self.default = Some(expr);
        self
    }

    #[must_use]
    pub const fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }

    /// Parse an `UPDATE_RULE` / `DELETE_RULE` catalog value.
    #[must_use]
    pub fn from_catalog(rule: &str) -> Option<Self> {
        match rule.trim().to_ascii_uppercase().as_str() {
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub name: Option<Identifier>,
    pub columns: Vec<Identifier>,
    pub referred_table: ObjectName,
    pub referred_columns: Vec<Identifier>,
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        name: Option<Identifier>,
        columns: Vec<Identifier>,
    },
    Unique {
        name: Option<Identifier>,
        columns: Vec<Identifier>,
    },
    ForeignKey(ForeignKeyDef),
    Check {
        name: Option<Identifier>,
        condition: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: ObjectName,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub comment: Option<String>,
}

impl TableDef {
    #[must_use]
    pub fn new(name: impl Into<ObjectName>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            comment: None,
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }
}

/// CREATE TABLE request. The table type lives here, not on the
/// definition, so one `TableDef` can be compiled with different prefixes.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableDef,
    pub table_type: Option<TableType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDef {
    pub name: ObjectName,
    pub start: Option<i64>,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cycle: bool,
    pub cache: Option<u32>,
}

impl SequenceDef {
    #[must_use]
    pub fn new(name: impl Into<ObjectName>) -> Self {
        Self {
            name: name.into(),
            start: None,
            increment: None,
            min_value: None,
            max_value: None,
            cycle: false,
            cache: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: Identifier,
    pub descending: bool,
}

impl From<&str> for IndexColumn {
    fn from(name: &str) -> Self {
        Self {
            name: name.into(),
            descending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: Identifier,
    pub table: ObjectName,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
}

/// New default for an altered column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultChange {
    Set(Expr),
    /// Rendered as `DEFAULT NULL`.
    Drop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterColumn {
    pub name: Identifier,
    /// HANA restates the full type on every column change.
    pub ty: PortableType,
    pub nullable: Option<bool>,
    pub default: Option<DefaultChange>,
}

/// Single-change migration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterOp {
    AddColumn(ColumnDef),
    DropColumn(Identifier),
    RenameColumn { from: Identifier, to: Identifier },
    AlterColumn(AlterColumn),
    RenameTable { to: Identifier },
    DropPrimaryKey,
    AddConstraint(TableConstraint),
    DropConstraint(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    Table(ObjectName),
    Column {
        table: ObjectName,
        column: Identifier,
    },
}

// ═══════════════════════════════════════════════════════════════════════════
// Statement
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Upsert(Upsert),
    CreateTable(CreateTable),
    DropTable(ObjectName),
    CreateView { name: ObjectName, query: Select },
    DropView(ObjectName),
    CreateSequence(SequenceDef),
    DropSequence(ObjectName),
    CreateIndex(IndexDef),
    DropIndex(ObjectName),
    AlterTable { table: ObjectName, op: AlterOp },
    Comment {
        target: CommentTarget,
        text: Option<String>,
    },
    /// `SET TRANSACTION AUTOCOMMIT DDL ON|OFF`
    SetAutocommitDdl(bool),
    /// A query returning no rows with the given number of columns.
    EmptySet { columns: usize },
}

impl Statement {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Upsert(_) => "upsert",
            Self::CreateTable(_) => "create_table",
            Self::DropTable(_) => "drop_table",
            Self::CreateView { .. } => "create_view",
            Self::DropView(_) => "drop_view",
            Self::CreateSequence(_) => "create_sequence",
            Self::DropSequence(_) => "drop_sequence",
            Self::CreateIndex(_) => "create_index",
            Self::DropIndex(_) => "drop_index",
            Self::AlterTable { .. } => "alter_table",
            Self::Comment { .. } => "comment",
            Self::SetAutocommitDdl(_) => "set_autocommit_ddl",
            Self::EmptySet { .. } => "empty_set",
        }
    }
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_flattens() {
        let expr = Expr::column("a")
            .eq(Expr::bind(1))
            .and(Expr::column("b").is_null())
            .and(Expr::column("c").is_true());
        match expr {
            Expr::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_accumulates() {
        let select = Select::new([Expr::star()])
            .from("t")
            .filter(Expr::column("a").is_null())
            .filter(Expr::column("b").is_null());
        assert!(matches!(select.filter, Some(Expr::And(ref v)) if v.len() == 2));
    }

    #[test]
    fn test_table_type_from_str() {
        assert_eq!("column".parse::<TableType>().unwrap(), TableType::Column);
        assert_eq!(
            "global_temporary".parse::<TableType>().unwrap(),
            TableType::GlobalTemporary
        );
        assert_eq!(
            "history column".parse::<TableType>().unwrap().as_sql(),
            "HISTORY COLUMN"
        );
    }

    #[test]
    fn test_object_name_schema() {
        let name = ObjectName::new("orders").in_schema("sales");
        assert_eq!(name.schema.as_ref().map(Identifier::as_str), Some("sales"));
        assert_eq!(name.name, "orders");
    }
}

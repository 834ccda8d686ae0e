//! Vendor-neutral expression tree.
//!
//! Expressions are built by the caller and rendered by a dialect's
//! [`ExpressionCompiler`](crate::dialect::ExpressionCompiler). Nothing here
//! knows about SQL syntax beyond operator symbols.

use serde::{Deserialize, Serialize};

use super::types::DataType;
use crate::builder::{SqlValue, ToSqlValue};

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> Expr {
    Expr::Column(ColumnRef::new(name))
}

/// Creates a table-qualified column reference.
#[must_use]
pub fn qualified(table: &str, name: &str) -> Expr {
    Expr::Column(ColumnRef::qualified(table, name))
}

/// Creates a bound argument.
#[must_use]
pub fn param<T: ToSqlValue>(value: T) -> Expr {
    Expr::Param(value.to_sql_value())
}

/// Creates an inline literal.
#[must_use]
pub fn lit<T: ToSqlValue>(value: T) -> Expr {
    Expr::Literal(value.to_sql_value())
}

/// Creates a raw SQL fragment.
///
/// **Warning**: Only use this for SQL fragments that don't contain user input.
#[must_use]
pub fn raw(sql: &str) -> Expr {
    Expr::Raw(String::from(sql))
}

/// Creates a reference to the value proposed for `column` by the insert
/// half of an upsert.
#[must_use]
pub fn excluded(column: &str) -> Expr {
    Expr::Excluded(String::from(column))
}

/// A column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Optional table qualifier.
    #[serde(default)]
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            table: None,
            name: String::from(name),
        }
    }

    /// Creates a qualified column reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            name: String::from(name),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Returns the operator as it appears between its operands.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => " AND ",
            Self::Or => " OR ",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div => 5,
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// Value rendered inline through the dialect's literal encoding.
    Literal(SqlValue),
    /// Value registered as a statement argument.
    Param(SqlValue),
    /// Raw SQL, emitted unchanged.
    Raw(String),
    /// The value an upsert proposed for a column.
    Excluded(String),
    /// Next value of a sequence.
    NextValue(String),
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// `IS [NOT] NULL`.
    IsNull {
        expr: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },
    /// `[NOT] IN (...)`.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        #[serde(default)]
        negated: bool,
    },
    /// `[NOT] LIKE`.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },
    /// Function call.
    Function(Box<Function>),
    /// Type conversion.
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },
}

impl Expr {
    fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    /// `self = other`
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self <> other`
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::NotEq, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::LtEq, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::GtEq, other)
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// `self + other`
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// `self - other`
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    /// `NOT self`
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `self IS NULL`
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// `self IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// `self LIKE pattern`
    #[must_use]
    pub fn like(self, pattern: Self) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern),
            negated: false,
        }
    }

    /// `self IN (list)`
    #[must_use]
    pub fn in_list(self, list: Vec<Self>) -> Self {
        Self::InList {
            expr: Box::new(self),
            list,
            negated: false,
        }
    }

    /// `CAST(self AS data_type)`
    #[must_use]
    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            data_type,
        }
    }

    /// Ascending sort key.
    #[must_use]
    pub fn asc(self) -> OrderBy {
        OrderBy {
            expr: self,
            order: SortOrder::Asc,
        }
    }

    /// Descending sort key.
    #[must_use]
    pub fn desc(self) -> OrderBy {
        OrderBy {
            expr: self,
            order: SortOrder::Desc,
        }
    }

    /// Returns true for nodes that render as a bare token or call.
    #[must_use]
    pub const fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Column(_)
                | Self::Literal(_)
                | Self::Param(_)
                | Self::Excluded(_)
                | Self::NextValue(_)
                | Self::Function(_)
                | Self::Cast { .. }
        )
    }
}

impl From<Function> for Expr {
    fn from(function: Function) -> Self {
        Self::Function(Box::new(function))
    }
}

/// Ordering of a sort key, including explicit null placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

impl SortOrder {
    /// Returns true for descending orders.
    #[must_use]
    pub const fn is_desc(self) -> bool {
        matches!(self, Self::Desc | Self::DescNullsFirst | Self::DescNullsLast)
    }

    /// Explicit null placement: `Some(true)` for NULLS FIRST, `Some(false)` for NULLS LAST.
    #[must_use]
    pub const fn nulls_first(self) -> Option<bool> {
        match self {
            Self::Asc | Self::Desc => None,
            Self::AscNullsFirst | Self::DescNullsFirst => Some(true),
            Self::AscNullsLast | Self::DescNullsLast => Some(false),
        }
    }

    /// The direction keyword.
    #[must_use]
    pub const fn direction(self) -> &'static str {
        if self.is_desc() {
            "DESC"
        } else {
            "ASC"
        }
    }
}

/// A sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: Expr,
    pub order: SortOrder,
}

/// Full-text search modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    NaturalLanguage,
    Boolean,
    QueryExpansion,
}

impl MatchMode {
    /// The mode clause appended inside `AGAINST (...)`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NaturalLanguage => " IN NATURAL LANGUAGE MODE",
            Self::Boolean => " IN BOOLEAN MODE",
            Self::QueryExpansion => " WITH QUERY EXPANSION",
        }
    }
}

/// Date and time fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatePart {
    /// The SQL field keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }
}

/// Standard aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Standard deviation and variance aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticalFunction {
    StdDevPop,
    StdDevSamp,
    VarPop,
    VarSamp,
}

impl StatisticalFunction {
    /// SQL-standard function name.
    #[must_use]
    pub const fn standard_name(self) -> &'static str {
        match self {
            Self::StdDevPop => "STDDEV_POP",
            Self::StdDevSamp => "STDDEV_SAMP",
            Self::VarPop => "VAR_POP",
            Self::VarSamp => "VAR_SAMP",
        }
    }
}

/// Function nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    CharLength(Expr),
    Lower(Expr),
    Upper(Expr),
    Substring {
        expr: Expr,
        start: Expr,
        length: Expr,
    },
    Concat {
        #[serde(default)]
        separator: Option<String>,
        exprs: Vec<Expr>,
    },
    GroupConcat {
        expr: Expr,
        #[serde(default)]
        separator: Option<String>,
        #[serde(default)]
        distinct: bool,
        #[serde(default)]
        order_by: Vec<OrderBy>,
    },
    /// 1-based position of `substring` in `expr`.
    Locate {
        expr: Expr,
        substring: String,
    },
    Regexp {
        expr: Expr,
        pattern: Expr,
        #[serde(default)]
        case_sensitive: bool,
    },
    /// Full-text match.
    Match {
        expr: Expr,
        pattern: String,
        #[serde(default)]
        mode: Option<MatchMode>,
    },
    DatePart {
        part: DatePart,
        expr: Expr,
    },
    Random {
        #[serde(default)]
        seed: Option<i64>,
    },
    Aggregate {
        func: AggregateFunction,
        /// `None` renders `COUNT(*)`.
        #[serde(default)]
        expr: Option<Expr>,
        #[serde(default)]
        distinct: bool,
    },
    Statistical {
        func: StatisticalFunction,
        expr: Expr,
    },
    Coalesce(Vec<Expr>),
    ArraySlice {
        expr: Expr,
        #[serde(default)]
        lower: Option<u32>,
        #[serde(default)]
        upper: Option<u32>,
    },
    /// Extracts the value at `path`; `to_scalar` unwraps it to text.
    JsonExtract {
        expr: Expr,
        path: Vec<String>,
        #[serde(default)]
        to_scalar: bool,
    },
    JsonContains {
        expr: Expr,
        candidate: Expr,
        #[serde(default)]
        path: Option<String>,
    },
    JsonExists {
        expr: Expr,
        paths: Vec<String>,
        #[serde(default)]
        optional: Option<String>,
    },
    /// Any other function, rendered as `name(args)`.
    Custom {
        name: String,
        args: Vec<Expr>,
    },
}

impl Function {
    /// Short name used in failure messages.
    #[must_use]
    pub const fn feature_name(&self) -> &'static str {
        match self {
            Self::CharLength(_) => "CHAR_LENGTH",
            Self::Lower(_) => "LOWER",
            Self::Upper(_) => "UPPER",
            Self::Substring { .. } => "SUBSTRING",
            Self::Concat { .. } => "CONCAT",
            Self::GroupConcat { .. } => "GROUP_CONCAT",
            Self::Locate { .. } => "LOCATE",
            Self::Regexp { .. } => "REGEXP",
            Self::Match { .. } => "MATCH",
            Self::DatePart { .. } => "date part extraction",
            Self::Random { .. } => "RANDOM",
            Self::Aggregate { .. } => "aggregate",
            Self::Statistical { .. } => "statistical aggregate",
            Self::Coalesce(_) => "COALESCE",
            Self::ArraySlice { .. } => "array slice",
            Self::JsonExtract { .. } => "JSON extract",
            Self::JsonContains { .. } => "JSON contains",
            Self::JsonExists { .. } => "JSON exists",
            Self::Custom { .. } => "custom function",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_comparisons() {
        let expr = col("id").eq(param(1)).and(col("name").is_not_null());
        match expr {
            Expr::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::And);
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Eq, .. }));
                assert!(matches!(*right, Expr::IsNull { negated: true, .. }));
            }
            other => panic!("Expected AND, got {other:?}"),
        }
    }

    #[test]
    fn sort_order_helpers() {
        assert_eq!(SortOrder::DescNullsLast.direction(), "DESC");
        assert_eq!(SortOrder::AscNullsFirst.nulls_first(), Some(true));
        assert_eq!(SortOrder::Asc.nulls_first(), None);
    }

    #[test]
    fn deserializes_expression_json() {
        let json = r#"{"binary": {"op": "eq", "left": {"column": {"name": "id"}}, "right": {"param": {"int": 1}}}}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(expr, col("id").eq(param(1)));
    }

    #[test]
    fn precedence_orders_logical_operators() {
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
    }
}

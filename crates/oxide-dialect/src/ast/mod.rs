//! Abstract operation and expression trees.
//!
//! These types describe *what* to do. A [`Dialect`](crate::dialect::Dialect)
//! decides how it is spelled.

mod expression;
mod schema;
mod statement;
mod types;

pub use expression::{
    col, excluded, lit, param, qualified, raw, AggregateFunction, BinaryOp, ColumnRef, DatePart,
    Expr, Function, MatchMode, OrderBy, SortOrder, StatisticalFunction,
};
pub use schema::{
    AutoIncrement, ColumnDef, ForeignKeyConstraint, Index, PrimaryKey, ReferenceOption, Sequence,
    TableDef,
};
pub use statement::{
    Assignment, DeleteOp, ExplainOp, ForUpdateOption, InsertOp, InsertSource, JoinClause,
    JoinType, Operation, ReplaceOp, SelectOp, UpdateOp, UpsertOp,
};
pub use types::{ColumnType, DataType};

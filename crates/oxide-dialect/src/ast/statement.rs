//! Whole-statement operations handed to a dialect for compilation.

use serde::{Deserialize, Serialize};

use super::expression::Expr;
use super::schema::{ForeignKeyConstraint, Index, Sequence, TableDef};

/// Row source of an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertSource {
    /// A single row of (column, value) pairs.
    Values(Vec<(String, Expr)>),
    /// `INSERT INTO t (columns) <query>`.
    Select { columns: Vec<String>, query: String },
}

/// `INSERT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOp {
    pub table: TableDef,
    pub source: InsertSource,
    /// Skip rows that violate a constraint instead of failing.
    #[serde(default)]
    pub ignore: bool,
}

impl InsertOp {
    /// Creates a single-row insert.
    #[must_use]
    pub fn values(table: TableDef, values: Vec<(&str, Expr)>) -> Self {
        Self {
            table,
            source: InsertSource::Values(
                values
                    .into_iter()
                    .map(|(c, v)| (String::from(c), v))
                    .collect(),
            ),
            ignore: false,
        }
    }

    /// Creates an insert fed by a sub-select.
    #[must_use]
    pub fn select(table: TableDef, columns: &[&str], query: &str) -> Self {
        Self {
            table,
            source: InsertSource::Select {
                columns: columns.iter().map(|c| String::from(*c)).collect(),
                query: String::from(query),
            },
            ignore: false,
        }
    }

    #[must_use]
    pub const fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// Join flavours usable in an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A joined table with its join condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    #[serde(default = "default_join_type")]
    pub join_type: JoinType,
    pub table: String,
    pub on: Expr,
}

const fn default_join_type() -> JoinType {
    JoinType::Inner
}

/// `SET column=value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

/// `UPDATE`, optionally joined and limited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOp {
    pub table: String,
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
}

impl UpdateOp {
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
            assignments: Vec::new(),
            filter: None,
            limit: None,
            joins: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: &str, value: Expr) -> Self {
        self.assignments.push(Assignment {
            column: String::from(column),
            value,
        });
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn join(mut self, table: &str, on: Expr) -> Self {
        self.joins.push(JoinClause {
            join_type: JoinType::Inner,
            table: String::from(table),
            on,
        });
        self
    }
}

/// `DELETE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub table: String,
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub ignore: bool,
}

impl DeleteOp {
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
            filter: None,
            limit: None,
            ignore: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// `REPLACE INTO`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceOp {
    pub table: String,
    pub source: InsertSource,
}

/// Insert-or-update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertOp {
    pub table: TableDef,
    pub data: Vec<(String, Expr)>,
    /// Explicit conflict target; falls back to the table's natural keys.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Explicit update list; defaults to every data column that is not a key.
    #[serde(default)]
    pub on_update: Option<Vec<(String, Expr)>>,
    #[serde(default)]
    pub on_update_exclude: Vec<String>,
    /// Only update rows matching this predicate.
    #[serde(default)]
    pub filter: Option<Expr>,
}

impl UpsertOp {
    #[must_use]
    pub fn new(table: TableDef, data: Vec<(&str, Expr)>) -> Self {
        Self {
            table,
            data: data
                .into_iter()
                .map(|(c, v)| (String::from(c), v))
                .collect(),
            keys: Vec::new(),
            on_update: None,
            on_update_exclude: Vec::new(),
            filter: None,
        }
    }

    #[must_use]
    pub fn keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|k| String::from(*k)).collect();
        self
    }

    #[must_use]
    pub fn on_update(mut self, updates: Vec<(&str, Expr)>) -> Self {
        self.on_update = Some(
            updates
                .into_iter()
                .map(|(c, v)| (String::from(c), v))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn exclude(mut self, columns: &[&str]) -> Self {
        self.on_update_exclude = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Row lock requested by a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForUpdateOption {
    ForUpdate,
    ForUpdateNoWait,
    ForUpdateSkipLocked,
    ForShare,
    ForShareNoWait,
    ForShareSkipLocked,
}

impl ForUpdateOption {
    /// Returns true for shared locks.
    #[must_use]
    pub const fn is_share(self) -> bool {
        matches!(
            self,
            Self::ForShare | Self::ForShareNoWait | Self::ForShareSkipLocked
        )
    }

    /// `NOWAIT` / `SKIP LOCKED` suffix, with a leading space.
    #[must_use]
    pub const fn wait_mode(self) -> &'static str {
        match self {
            Self::ForUpdate | Self::ForShare => "",
            Self::ForUpdateNoWait | Self::ForShareNoWait => " NOWAIT",
            Self::ForUpdateSkipLocked | Self::ForShareSkipLocked => " SKIP LOCKED",
        }
    }
}

/// A pre-rendered query with pagination and locking applied by the dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOp {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    /// The query already carries an `ORDER BY`.
    #[serde(default)]
    pub ordered: bool,
    #[serde(default)]
    pub lock: Option<ForUpdateOption>,
}

/// `EXPLAIN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainOp {
    #[serde(default)]
    pub analyze: bool,
    /// Vendor options, emitted as given.
    #[serde(default)]
    pub options: Option<String>,
    pub statement: Box<Operation>,
}

/// An operation the dialect can compile to one or more statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert(InsertOp),
    Update(UpdateOp),
    Delete(DeleteOp),
    Replace(ReplaceOp),
    Upsert(UpsertOp),
    Select(SelectOp),
    Explain(ExplainOp),
    CreateTable {
        table: TableDef,
        #[serde(default)]
        if_not_exists: bool,
    },
    DropTable {
        name: String,
        #[serde(default)]
        if_exists: bool,
        #[serde(default)]
        cascade: bool,
    },
    CreateIndex(Index),
    DropIndex(Index),
    AddForeignKey(ForeignKeyConstraint),
    DropForeignKey(ForeignKeyConstraint),
    CreateSequence(Sequence),
    DropSequence {
        name: String,
    },
    CreateSchema {
        name: String,
    },
    DropSchema {
        name: String,
        #[serde(default)]
        cascade: bool,
    },
    SetSchema {
        name: String,
    },
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
}

impl From<InsertOp> for Operation {
    fn from(op: InsertOp) -> Self {
        Self::Insert(op)
    }
}

impl From<UpdateOp> for Operation {
    fn from(op: UpdateOp) -> Self {
        Self::Update(op)
    }
}

impl From<DeleteOp> for Operation {
    fn from(op: DeleteOp) -> Self {
        Self::Delete(op)
    }
}

impl From<ReplaceOp> for Operation {
    fn from(op: ReplaceOp) -> Self {
        Self::Replace(op)
    }
}

impl From<UpsertOp> for Operation {
    fn from(op: UpsertOp) -> Self {
        Self::Upsert(op)
    }
}

impl From<SelectOp> for Operation {
    fn from(op: SelectOp) -> Self {
        Self::Select(op)
    }
}

impl From<ExplainOp> for Operation {
    fn from(op: ExplainOp) -> Self {
        Self::Explain(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, param};

    #[test]
    fn deserializes_delete_operation() {
        let json = r#"{"delete": {"table": "t", "filter": {"binary": {"op": "eq", "left": {"column": {"name": "id"}}, "right": {"literal": {"int": 1}}}}}}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        match op {
            Operation::Delete(d) => {
                assert_eq!(d.table, "t");
                assert!(d.limit.is_none());
                assert!(!d.ignore);
            }
            other => panic!("Expected DELETE, got {other:?}"),
        }
    }

    #[test]
    fn builders_fill_fields() {
        let update = UpdateOp::new("t")
            .set("name", param("a"))
            .filter(col("id").eq(param(1)))
            .limit(3);
        assert_eq!(update.assignments.len(), 1);
        assert_eq!(update.limit, Some(3));

        let upsert = UpsertOp::new(TableDef::new("t"), vec![("id", param(1))]).keys(&["id"]);
        assert_eq!(upsert.keys, vec![String::from("id")]);
    }

    #[test]
    fn lock_options() {
        assert!(ForUpdateOption::ForShareNoWait.is_share());
        assert_eq!(ForUpdateOption::ForUpdateSkipLocked.wait_mode(), " SKIP LOCKED");
    }
}

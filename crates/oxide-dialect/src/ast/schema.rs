//! Table, column, index and constraint definitions.

use serde::{Deserialize, Serialize};

use super::expression::Expr;
use super::types::ColumnType;

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceOption {
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
    /// Restrict deletion/update.
    Restrict,
    /// No action.
    NoAction,
}

impl ReferenceOption {
    /// Returns the SQL representation of the action.
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

    /// Maps a JDBC-style metadata rule code. Unknown codes yield `None`.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Cascade),
            1 => Some(Self::Restrict),
            2 => Some(Self::SetNull),
            3 => Some(Self::NoAction),
            4 => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// A sequence definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    #[serde(default)]
    pub start_with: Option<i64>,
    #[serde(default)]
    pub increment_by: Option<i64>,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub cycle: Option<bool>,
    #[serde(default)]
    pub cache: Option<i64>,
}

impl Sequence {
    /// Creates a sequence with vendor defaults for every option.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_with: None,
            increment_by: None,
            min_value: None,
            max_value: None,
            cycle: None,
            cache: None,
        }
    }

    #[must_use]
    pub const fn start_with(mut self, value: i64) -> Self {
        self.start_with = Some(value);
        self
    }

    #[must_use]
    pub const fn increment_by(mut self, value: i64) -> Self {
        self.increment_by = Some(value);
        self
    }
}

/// Autoincrement settings of a column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoIncrement {
    /// Explicit backing sequence. Dialects that need a sequence and get
    /// none use `<table>_<column>_seq`.
    #[serde(default)]
    pub sequence: Option<Sequence>,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default)]
    pub default: Option<Expr>,
    #[serde(default)]
    pub auto_increment: Option<AutoIncrement>,
}

impl ColumnDef {
    /// Creates a column without default or autoincrement.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            default: None,
            auto_increment: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, expr: Expr) -> Self {
        self.default = Some(expr);
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = Some(AutoIncrement::default());
        self
    }

    #[must_use]
    pub fn auto_increment_with(mut self, sequence: Sequence) -> Self {
        self.auto_increment = Some(AutoIncrement {
            sequence: Some(sequence),
        });
        self
    }
}

/// A primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// A foreign key constraint as a list of (from column, target column) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    #[serde(default)]
    pub name: Option<String>,
    pub from_table: String,
    pub target_table: String,
    pub references: Vec<(String, String)>,
    #[serde(default)]
    pub on_update: Option<ReferenceOption>,
    #[serde(default)]
    pub on_delete: Option<ReferenceOption>,
}

impl ForeignKeyConstraint {
    /// Creates a single-column foreign key.
    #[must_use]
    pub fn new(from_table: &str, from_column: &str, target_table: &str, target_column: &str) -> Self {
        Self {
            name: None,
            from_table: String::from(from_table),
            target_table: String::from(target_table),
            references: vec![(String::from(from_column), String::from(target_column))],
            on_update: None,
            on_delete: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn on_delete(mut self, option: ReferenceOption) -> Self {
        self.on_delete = Some(option);
        self
    }

    #[must_use]
    pub const fn on_update(mut self, option: ReferenceOption) -> Self {
        self.on_update = Some(option);
        self
    }

    /// Columns of the referencing table, in key order.
    pub fn from_columns(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|(from, _)| from.as_str())
    }

    /// Columns of the referenced table, in key order.
    pub fn target_columns(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|(_, target)| target.as_str())
    }

    /// Appends the column pairs of `other`, which must describe the same constraint.
    pub fn merge(&mut self, other: Self) {
        self.references.extend(other.references);
    }

    /// Generated name: `fk_<from>_<cols>__<targetcols>`.
    #[must_use]
    pub fn default_name(&self) -> String {
        let from: Vec<&str> = self.from_columns().collect();
        let target: Vec<&str> = self.target_columns().collect();
        format!(
            "fk_{}_{}__{}",
            self.from_table,
            from.join("_"),
            target.join("_")
        )
    }
}

/// FNV-1a over the debug rendering of an expression.
fn expression_digest(expr: &Expr) -> u32 {
    format!("{expr:?}")
        .bytes()
        .fold(0x811c_9dc5, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
}

/// An index over columns and/or function expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub functions: Vec<Expr>,
    #[serde(default)]
    pub unique: bool,
    /// Vendor index method such as `GIN`, `BTREE`, `CLUSTERED` or `BITMAP`.
    #[serde(default)]
    pub index_type: Option<String>,
    /// Partial index predicate.
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Index {
    /// Creates a plain index over `columns`.
    #[must_use]
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: String::from(table),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            functions: Vec::new(),
            unique: false,
            index_type: None,
            filter: None,
            name: None,
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = Some(index_type.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: Expr) -> Self {
        self.functions.push(function);
        self
    }

    /// The custom name, or `<table>_<col1>_<col2>[_expr<hash>][_unique]`.
    ///
    /// Function keys contribute a digest of the expression, so distinct
    /// functional indices on one table get distinct names.
    #[must_use]
    pub fn index_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut name = self.table.clone();
        for column in &self.columns {
            name.push('_');
            name.push_str(column);
        }
        for function in &self.functions {
            name.push_str(&format!("_expr{:08x}", expression_digest(function)));
        }
        if self.unique {
            name.push_str("_unique");
        }
        name
    }

    /// Returns true when only plain columns are indexed.
    #[must_use]
    pub fn is_columns_only(&self) -> bool {
        self.functions.is_empty() && !self.columns.is_empty()
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub indices: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConstraint>,
}

impl TableDef {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: None,
            indices: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = Some(PrimaryKey {
            name: None,
            columns: columns.iter().map(|c| String::from(*c)).collect(),
        });
        self
    }

    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indices.push(index);
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyConstraint) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Schema-qualified name when a schema is set.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Conflict target of an upsert: the primary key, then the first unique index.
    #[must_use]
    pub fn natural_keys(&self) -> Option<Vec<String>> {
        if let Some(pk) = &self.primary_key {
            if !pk.columns.is_empty() {
                return Some(pk.columns.clone());
            }
        }
        self.indices
            .iter()
            .find(|idx| idx.unique && idx.is_columns_only())
            .map(|idx| idx.columns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;

    #[test]
    fn reference_option_codes() {
        assert_eq!(ReferenceOption::from_code(0), Some(ReferenceOption::Cascade));
        assert_eq!(ReferenceOption::from_code(3), Some(ReferenceOption::NoAction));
        assert_eq!(ReferenceOption::from_code(9), None);
        assert_eq!(ReferenceOption::SetNull.as_sql(), "SET NULL");
    }

    #[test]
    fn index_default_name() {
        let idx = Index::new("users", &["email", "tenant"]).unique();
        assert_eq!(idx.index_name(), "users_email_tenant_unique");
        assert_eq!(idx.named("ux").index_name(), "ux");
    }

    #[test]
    fn functional_index_names_are_distinct() {
        use crate::ast::{col, Function};

        let lower = Index::new("t", &[]).with_function(Function::Lower(col("name")).into());
        let upper = Index::new("t", &[]).with_function(Function::Upper(col("name")).into());
        assert_ne!(lower.index_name(), "t");
        assert!(lower.index_name().starts_with("t_expr"));
        assert_ne!(lower.index_name(), upper.index_name());
        assert_eq!(lower.index_name(), lower.clone().index_name());
    }

    #[test]
    fn natural_keys_prefer_primary_key() {
        let table = TableDef::new("t")
            .column(ColumnDef::new("id", DataType::Integer))
            .column(ColumnDef::new("code", DataType::Varchar(10)))
            .index(Index::new("t", &["code"]).unique());
        assert_eq!(table.natural_keys(), Some(vec![String::from("code")]));

        let table = table.primary_key(&["id"]);
        assert_eq!(table.natural_keys(), Some(vec![String::from("id")]));
    }

    #[test]
    fn foreign_key_merge_and_name() {
        let mut fk = ForeignKeyConstraint::new("orders", "a", "items", "x");
        fk.merge(ForeignKeyConstraint::new("orders", "b", "items", "y"));
        assert_eq!(fk.references.len(), 2);
        assert_eq!(fk.default_name(), "fk_orders_a_b__x_y");
    }
}

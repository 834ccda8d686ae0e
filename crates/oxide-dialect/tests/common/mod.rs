#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use oxide_dialect::ast::{ColumnDef, DataType, Index, Operation, TableDef};
use oxide_dialect::introspect::{
    MetadataSource, RawColumn, RawForeignKeyColumn, RawIndexColumn, RawPrimaryKeyColumn,
};
use oxide_dialect::{CompiledStatement, Dialect, DialectConfig, DialectError, DialectKind};

pub fn dialect(kind: DialectKind) -> Dialect {
    Dialect::new(kind)
}

pub fn inline(kind: DialectKind) -> Dialect {
    Dialect::with_config(kind, DialectConfig::default().inline())
        .unwrap_or_else(|e| panic!("Failed to build {kind} dialect: {e}"))
}

/// Compiles an operation expected to produce exactly one statement.
pub fn compile_one(d: &Dialect, op: impl Into<Operation>) -> CompiledStatement {
    let mut statements = compile_all(d, op);
    assert_eq!(
        statements.len(),
        1,
        "Expected one statement on {}, got {statements:?}",
        d.name()
    );
    statements.remove(0)
}

pub fn compile_all(d: &Dialect, op: impl Into<Operation>) -> Vec<CompiledStatement> {
    d.compile(&op.into())
        .unwrap_or_else(|e| panic!("Failed to compile on {}: {e}", d.name()))
}

pub fn compile_sql(d: &Dialect, op: impl Into<Operation>) -> String {
    compile_one(d, op).sql
}

pub fn compile_err(d: &Dialect, op: impl Into<Operation>) -> DialectError {
    match d.compile(&op.into()) {
        Ok(statements) => panic!("Expected an error on {}, got {statements:?}", d.name()),
        Err(e) => e,
    }
}

/// `users` keyed by a unique index on `email`, without a primary key.
pub fn users_by_email() -> TableDef {
    TableDef::new("users")
        .column(ColumnDef::new("email", DataType::Varchar(100)))
        .column(ColumnDef::new("name", DataType::Varchar(50)))
        .index(Index::new("users", &["email"]).unique())
}

// ===================================================================
// In-memory catalog
// ===================================================================

#[derive(Debug, thiserror::Error)]
#[error("catalog query failed")]
pub struct CatalogError;

/// Catalog rows served from memory, counting every per-table fetch.
#[derive(Debug, Default)]
pub struct Catalog {
    pub tables: Vec<String>,
    pub schemas: Vec<String>,
    pub sequences: Vec<String>,
    pub columns: Vec<RawColumn>,
    pub primary_keys: Vec<RawPrimaryKeyColumn>,
    pub foreign_keys: Vec<RawForeignKeyColumn>,
    pub indices: Vec<RawIndexColumn>,
    pub fail: bool,
    pub list_calls: Cell<usize>,
    pub fetches: RefCell<Vec<Vec<String>>>,
}

impl Catalog {
    fn record(&self, tables: &[String]) -> Result<(), CatalogError> {
        if self.fail {
            return Err(CatalogError);
        }
        self.fetches.borrow_mut().push(tables.to_vec());
        Ok(())
    }

    fn listed(&self, names: &[String]) -> Result<Vec<String>, CatalogError> {
        if self.fail {
            return Err(CatalogError);
        }
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(names.to_vec())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }

    pub fn last_fetch(&self) -> Vec<String> {
        self.fetches.borrow().last().cloned().unwrap_or_default()
    }
}

impl MetadataSource for Catalog {
    type Error = CatalogError;

    fn tables(&self, _schema: Option<&str>) -> Result<Vec<String>, CatalogError> {
        self.listed(&self.tables)
    }

    fn schemas(&self) -> Result<Vec<String>, CatalogError> {
        self.listed(&self.schemas)
    }

    fn sequences(&self, _schema: Option<&str>) -> Result<Vec<String>, CatalogError> {
        self.listed(&self.sequences)
    }

    fn columns(&self, tables: &[String]) -> Result<Vec<RawColumn>, CatalogError> {
        self.record(tables)?;
        Ok(self
            .columns
            .iter()
            .filter(|c| tables.contains(&c.table))
            .cloned()
            .collect())
    }

    fn primary_keys(&self, tables: &[String]) -> Result<Vec<RawPrimaryKeyColumn>, CatalogError> {
        self.record(tables)?;
        Ok(self
            .primary_keys
            .iter()
            .filter(|c| tables.contains(&c.table))
            .cloned()
            .collect())
    }

    fn foreign_keys(&self, tables: &[String]) -> Result<Vec<RawForeignKeyColumn>, CatalogError> {
        self.record(tables)?;
        Ok(self
            .foreign_keys
            .iter()
            .filter(|c| tables.contains(&c.from_table))
            .cloned()
            .collect())
    }

    fn indices(&self, tables: &[String]) -> Result<Vec<RawIndexColumn>, CatalogError> {
        self.record(tables)?;
        Ok(self
            .indices
            .iter()
            .filter(|c| tables.contains(&c.table))
            .cloned()
            .collect())
    }
}

pub fn raw_column(table: &str, name: &str, type_name: &str, default: Option<&str>) -> RawColumn {
    RawColumn {
        table: String::from(table),
        name: String::from(name),
        type_code: 12,
        type_name: String::from(type_name),
        nullable: true,
        size: None,
        scale: None,
        auto_increment: false,
        default_value: default.map(String::from),
    }
}

pub fn raw_pk(table: &str, name: &str, column: &str, position: u32) -> RawPrimaryKeyColumn {
    RawPrimaryKeyColumn {
        table: String::from(table),
        name: Some(String::from(name)),
        column: String::from(column),
        position,
    }
}

pub fn raw_fk(
    name: &str,
    from: (&str, &str),
    target: (&str, &str),
    position: u32,
) -> RawForeignKeyColumn {
    RawForeignKeyColumn {
        name: String::from(name),
        from_table: String::from(from.0),
        from_column: String::from(from.1),
        target_table: String::from(target.0),
        target_column: String::from(target.1),
        position,
        update_rule: 3,
        delete_rule: 0,
    }
}

pub fn raw_index(table: &str, name: &str, column: &str, unique: bool, position: u32) -> RawIndexColumn {
    RawIndexColumn {
        table: String::from(table),
        name: String::from(name),
        column: String::from(column),
        unique,
        position,
    }
}

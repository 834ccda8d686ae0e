//! Raw catalog rows and the collaborator that produces them.

use serde::{Deserialize, Serialize};

/// Source of live schema metadata.
///
/// Implemented by the caller over whatever connection it holds. Every
/// method receives the exact table names to fetch, already in database
/// case, and returns raw rows; grouping, ordering and normalization happen
/// in [`SchemaIntrospector`](super::SchemaIntrospector).
pub trait MetadataSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Table names in `schema`, or in the connection's default schema.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn tables(&self, schema: Option<&str>) -> Result<Vec<String>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn schemas(&self) -> Result<Vec<String>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn sequences(&self, schema: Option<&str>) -> Result<Vec<String>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn columns(&self, tables: &[String]) -> Result<Vec<RawColumn>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn primary_keys(&self, tables: &[String]) -> Result<Vec<RawPrimaryKeyColumn>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn foreign_keys(&self, tables: &[String]) -> Result<Vec<RawForeignKeyColumn>, Self::Error>;

    /// # Errors
    ///
    /// Any failure of the underlying catalog query.
    fn indices(&self, tables: &[String]) -> Result<Vec<RawIndexColumn>, Self::Error>;
}

/// One column row as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumn {
    pub table: String,
    pub name: String,
    /// Vendor type code (JDBC `DATA_TYPE`).
    pub type_code: i32,
    pub type_name: String,
    pub nullable: bool,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub auto_increment: bool,
    /// Default expression exactly as stored by the database.
    #[serde(default)]
    pub default_value: Option<String>,
}

/// One column of a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrimaryKeyColumn {
    pub table: String,
    #[serde(default)]
    pub name: Option<String>,
    pub column: String,
    /// 1-based position in the key.
    pub position: u32,
}

/// One column pair of a foreign key. Composite keys span several rows
/// sharing `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawForeignKeyColumn {
    pub name: String,
    pub from_table: String,
    pub from_column: String,
    pub target_table: String,
    pub target_column: String,
    pub position: u32,
    /// JDBC-style rule codes: 0 cascade, 1 restrict, 2 set null, 3 no action, 4 set default.
    pub update_rule: i32,
    pub delete_rule: i32,
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIndexColumn {
    pub table: String,
    pub name: String,
    pub column: String,
    pub unique: bool,
    pub position: u32,
}

/// An introspected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_code: i32,
    pub type_name: String,
    pub nullable: bool,
    pub size: Option<u32>,
    pub scale: Option<u32>,
    pub auto_increment: bool,
    /// Default expression normalized by the dialect.
    pub default_value: Option<String>,
}

/// An introspected primary key with its columns in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyMetadata {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

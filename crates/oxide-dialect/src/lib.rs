//! # oxide-dialect
//!
//! Compiles vendor-neutral database operations into the SQL text of a
//! specific database.
//!
//! This crate provides:
//! - A capability model describing what each database supports
//! - Type mapping, expression and statement compilation per vendor
//! - Identifier quoting and case folding rules
//! - A read-through cache over live schema metadata
//!
//! ## Compiling Operations
//!
//! Operations are abstract trees. A [`Dialect`] decides how they are spelled:
//!
//! ```rust
//! use oxide_dialect::ast::{param, ColumnDef, DataType, TableDef, UpsertOp};
//! use oxide_dialect::{Dialect, DialectConfig, DialectKind};
//!
//! let pg = Dialect::with_config(DialectKind::PostgreSql, DialectConfig::default().inline())
//!     .unwrap();
//! let table = TableDef::new("t")
//!     .column(ColumnDef::new("id", DataType::Integer))
//!     .column(ColumnDef::new("name", DataType::Varchar(20)))
//!     .primary_key(&["id"]);
//! let op = UpsertOp::new(table, vec![("id", param(1)), ("name", param("a"))]);
//! let statements = pg.compile(&op.into()).unwrap();
//! assert_eq!(
//!     statements[0].sql,
//!     "INSERT INTO t (id,name) VALUES (1,'a') ON CONFLICT (id) DO UPDATE SET name=EXCLUDED.name"
//! );
//! ```
//!
//! ## Unsupported Features
//!
//! Anything a database cannot express fails with
//! [`DialectError::UnsupportedByDialect`] instead of producing invalid SQL:
//!
//! ```rust
//! use oxide_dialect::ast::DeleteOp;
//! use oxide_dialect::{Dialect, DialectKind};
//!
//! let sqlite = Dialect::new(DialectKind::Sqlite);
//! let err = sqlite.compile(&DeleteOp::new("t").limit(3).into()).unwrap_err();
//! assert!(err.unsupported_feature().is_some());
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod introspect;

pub use builder::{CompiledStatement, SqlValue, ToSqlValue};
pub use config::{DatabaseVersion, DialectConfig};
pub use dialect::{Dialect, DialectKind, DialectRegistry};
pub use error::{DialectError, Result};
pub use introspect::{MetadataSource, SchemaIntrospector};

//! SQL dialect support.
//!
//! A [`Dialect`] composes a [`CapabilityFlags`] record, an
//! [`IdentifierManager`] and three vendor objects implementing
//! [`TypeMapper`], [`ExpressionCompiler`] and [`StatementCompiler`]. The
//! traits carry SQL-standard defaults; each vendor overrides only where it
//! deviates.
//!
//! ```rust
//! use oxide_dialect::ast::{col, lit, DeleteOp};
//! use oxide_dialect::dialect::{Dialect, DialectKind};
//!
//! let dialect = Dialect::new(DialectKind::Generic);
//! let op = DeleteOp::new("t").filter(col("id").eq(lit(1)));
//! let statements = dialect.compile(&op.into()).unwrap();
//! assert_eq!(statements[0].sql, "DELETE FROM t WHERE id=1");
//! ```

mod capability;
mod functions;
mod generic;
mod h2;
mod identifier;
mod mysql;
mod oracle;
mod postgres;
mod registry;
mod sqlite;
mod sqlserver;
mod statements;
mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use capability::{CapabilityFlags, ParameterStyle, RowLimitStyle};
pub use functions::ExpressionCompiler;
pub use generic::GenericDialect;
pub use h2::H2Dialect;
pub use identifier::{IdentifierCase, IdentifierManager};
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use registry::{dialect_name_from_url, DialectRegistry};
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;
pub use statements::{IgnoreClause, MergeFilter, MergeSource, MergeStyle, StatementCompiler};
pub use types::{TypeMapper, UuidEncoding};

use crate::ast::{ColumnType, Expr, ForUpdateOption, Index, Operation, OrderBy, ReferenceOption};
use crate::builder::{CompiledStatement, SqlValue, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::{DialectError, Result};
use crate::introspect::{MetadataSource, SchemaCache, SchemaIntrospector};

/// The built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// SQL standard.
    Generic,
    PostgreSql,
    MySql,
    MariaDb,
    Sqlite,
    Oracle,
    SqlServer,
    H2,
}

impl DialectKind {
    pub const ALL: [Self; 8] = [
        Self::Generic,
        Self::PostgreSql,
        Self::MySql,
        Self::MariaDb,
        Self::Sqlite,
        Self::Oracle,
        Self::SqlServer,
        Self::H2,
    ];

    /// Name used in every failure message.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
            Self::H2 => "h2",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" | "standard" => Ok(Self::Generic),
            "postgresql" | "postgres" | "pg" | "pgsql" => Ok(Self::PostgreSql),
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "oracle" => Ok(Self::Oracle),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "h2" => Ok(Self::H2),
            _ => Err(DialectError::UnknownDialect(s.to_owned())),
        }
    }
}

/// One configured database dialect.
///
/// Compilation is pure; the only mutable state is the schema metadata
/// cache, so a dialect can be shared across threads.
pub struct Dialect {
    kind: DialectKind,
    config: DialectConfig,
    capabilities: CapabilityFlags,
    identifiers: IdentifierManager,
    types: &'static dyn TypeMapper,
    expressions: &'static dyn ExpressionCompiler,
    statements: &'static dyn StatementCompiler,
    cache: SchemaCache,
}

impl Dialect {
    /// Creates a dialect with the default configuration.
    #[must_use]
    pub fn new(kind: DialectKind) -> Self {
        Self::build(kind, DialectConfig::default())
    }

    /// Creates a dialect with `config` applied.
    ///
    /// # Errors
    ///
    /// [`DialectError::InvalidConfiguration`] for a zero identifier length limit.
    pub fn with_config(kind: DialectKind, config: DialectConfig) -> Result<Self> {
        if config.identifier_length_limit == Some(0) {
            return Err(DialectError::invalid(
                "identifier_length_limit must be greater than zero",
            ));
        }
        Ok(Self::build(kind, config))
    }

    fn build(kind: DialectKind, config: DialectConfig) -> Self {
        let (capabilities, identifiers) = match kind {
            DialectKind::Generic => generic::profile(&config),
            DialectKind::PostgreSql => postgres::profile(&config),
            DialectKind::MySql | DialectKind::MariaDb => mysql::profile(kind, &config),
            DialectKind::Sqlite => sqlite::profile(&config),
            DialectKind::Oracle => oracle::profile(&config),
            DialectKind::SqlServer => sqlserver::profile(&config),
            DialectKind::H2 => h2::profile(&config),
        };
        let mut identifiers = identifiers.with_keyword_casing(config.preserve_keyword_casing);
        if let Some(limit) = config.identifier_length_limit {
            identifiers = identifiers.with_length_limit(Some(limit));
        }

        let (types, expressions, statements): (
            &'static dyn TypeMapper,
            &'static dyn ExpressionCompiler,
            &'static dyn StatementCompiler,
        ) = match kind {
            DialectKind::Generic => (&GenericDialect, &GenericDialect, &GenericDialect),
            DialectKind::PostgreSql => (&PostgresDialect, &PostgresDialect, &PostgresDialect),
            DialectKind::MySql | DialectKind::MariaDb => {
                (&MySqlDialect, &MySqlDialect, &MySqlDialect)
            }
            DialectKind::Sqlite => (&SqliteDialect, &SqliteDialect, &SqliteDialect),
            DialectKind::Oracle => (&OracleDialect, &OracleDialect, &OracleDialect),
            DialectKind::SqlServer => (&SqlServerDialect, &SqlServerDialect, &SqlServerDialect),
            DialectKind::H2 => (&H2Dialect, &H2Dialect, &H2Dialect),
        };

        Self {
            kind,
            config,
            capabilities,
            identifiers,
            types,
            expressions,
            statements,
            cache: SchemaCache::default(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DialectKind {
        self.kind
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub const fn config(&self) -> &DialectConfig {
        &self.config
    }

    #[must_use]
    pub const fn capabilities(&self) -> &CapabilityFlags {
        &self.capabilities
    }

    #[must_use]
    pub const fn identifiers(&self) -> &IdentifierManager {
        &self.identifiers
    }

    #[must_use]
    pub fn types(&self) -> &dyn TypeMapper {
        self.types
    }

    #[must_use]
    pub fn expressions(&self) -> &dyn ExpressionCompiler {
        self.expressions
    }

    #[must_use]
    pub fn statements(&self) -> &dyn StatementCompiler {
        self.statements
    }

    /// Builds the failure for a feature this dialect cannot express.
    #[must_use]
    pub fn unsupported(&self, feature: impl Into<String>) -> DialectError {
        DialectError::unsupported(self.name(), feature)
    }

    /// Compiles an operation to the statements that implement it.
    ///
    /// Most operations yield one statement. Table creation also yields its
    /// sequences and indices, and an index the dialect cannot express
    /// yields none.
    ///
    /// # Errors
    ///
    /// [`DialectError::UnsupportedByDialect`] when any part of the operation
    /// cannot be expressed, [`DialectError::InvalidConfiguration`] when the
    /// operation itself is malformed.
    pub fn compile(&self, operation: &Operation) -> Result<Vec<CompiledStatement>> {
        let s = self.statements;
        let statements = match operation {
            Operation::Insert(op) => vec![s.insert(self, op)?],
            Operation::Update(op) => vec![s.update(self, op)?],
            Operation::Delete(op) => vec![s.delete(self, op)?],
            Operation::Replace(op) => vec![s.replace(self, op)?],
            Operation::Upsert(op) => vec![s.upsert(self, op)?],
            Operation::Select(op) => vec![s.select(self, op)?],
            Operation::Explain(op) => vec![s.explain(self, op)?],
            Operation::CreateTable {
                table,
                if_not_exists,
            } => texts(s.create_table(self, table, *if_not_exists)?),
            Operation::DropTable {
                name,
                if_exists,
                cascade,
            } => texts([s.drop_table(self, name, *if_exists, *cascade)?]),
            Operation::CreateIndex(index) => texts(s.create_index(self, index)?),
            Operation::DropIndex(index) => texts([s.drop_index(self, index)?]),
            Operation::AddForeignKey(fk) => texts([s.add_foreign_key(self, fk)?]),
            Operation::DropForeignKey(fk) => texts([s.drop_foreign_key(self, fk)?]),
            Operation::CreateSequence(sequence) => texts([s.create_sequence(self, sequence)?]),
            Operation::DropSequence { name } => texts([s.drop_sequence(self, name)?]),
            Operation::CreateSchema { name } => texts([s.create_schema(self, name)?]),
            Operation::DropSchema { name, cascade } => {
                texts([s.drop_schema(self, name, *cascade)?])
            }
            Operation::SetSchema { name } => texts([s.set_schema(self, name)?]),
            Operation::CreateDatabase { name } => texts([s.create_database(self, name)?]),
            Operation::DropDatabase { name } => texts([s.drop_database(self, name)?]),
        };
        for statement in &statements {
            debug!(
                dialect = self.name(),
                sql = %statement.sql,
                params = statement.params.len(),
                "Compiled statement"
            );
        }
        Ok(statements)
    }

    /// Compiles a standalone expression.
    ///
    /// # Errors
    ///
    /// Fails when the expression uses a function the dialect lacks.
    pub fn compile_expr(&self, expr: &Expr) -> Result<CompiledStatement> {
        let mut buf = StatementBuffer::new(self);
        buf.push_expr(expr)?;
        Ok(buf.finish())
    }

    /// Renders sort keys, emulating null ordering where needed.
    ///
    /// # Errors
    ///
    /// Propagates expression failures.
    pub fn compile_order_by(&self, items: &[OrderBy]) -> Result<String> {
        let mut buf = StatementBuffer::inline(self);
        self.expressions.order_by_list(items, &mut buf)?;
        Ok(buf.finish().sql)
    }

    /// Renders the DDL type of a column, without nullability.
    ///
    /// # Errors
    ///
    /// Fails when the type is not storable on this dialect.
    pub fn render_type(&self, column_type: &ColumnType) -> Result<String> {
        self.types.render_type(self, &column_type.data_type)
    }

    /// Converts a value to its bind form for a column.
    ///
    /// # Errors
    ///
    /// Rejects nulls in NOT NULL columns and malformed values.
    pub fn encode_value(&self, column_type: &ColumnType, value: SqlValue) -> Result<SqlValue> {
        self.types.encode_value(column_type, value)
    }

    #[must_use]
    pub fn literal(&self, value: &SqlValue) -> String {
        self.types.literal(value)
    }

    /// Pagination clause for a query, empty when neither bound is set.
    #[must_use]
    pub fn query_limit(&self, limit: Option<u64>, offset: u64, already_ordered: bool) -> String {
        self.statements
            .query_limit(self, limit, offset, already_ordered)
    }

    /// # Errors
    ///
    /// Invalid index definitions fail; inexpressible ones yield `Ok(None)`.
    pub fn create_index(&self, index: &Index) -> Result<Option<String>> {
        self.statements.create_index(self, index)
    }

    #[must_use]
    pub fn next_value(&self, sequence: &str) -> String {
        self.expressions.next_value(self, sequence)
    }

    /// # Errors
    ///
    /// Fails where row locking in that mode is unavailable.
    pub fn select_lock_clause(&self, option: ForUpdateOption) -> Result<String> {
        self.statements.select_lock_clause(self, option)
    }

    /// Maps a catalog reference-action code to a [`ReferenceOption`].
    ///
    /// MySQL reports `NO ACTION` with the `RESTRICT` code; Oracle reports
    /// its implicit `NO ACTION` as `RESTRICT`.
    #[must_use]
    pub const fn resolve_reference_option(&self, code: i32) -> Option<ReferenceOption> {
        match (self.kind, code) {
            (DialectKind::MySql | DialectKind::MariaDb, 1 | 3) => Some(ReferenceOption::Restrict),
            (DialectKind::Oracle, 1) => Some(ReferenceOption::NoAction),
            _ => ReferenceOption::from_code(code),
        }
    }

    /// Binds the schema cache of this dialect to a metadata source.
    pub fn introspector<'d, S: MetadataSource>(
        &'d self,
        source: &'d S,
    ) -> SchemaIntrospector<'d, S> {
        SchemaIntrospector::new(self, source)
    }

    pub(crate) const fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Clears cached table metadata, keeping the schema list.
    pub fn reset_caches(&self) {
        self.cache.clear();
    }

    /// Clears every cached entry including the schema list.
    pub fn reset_schema_caches(&self) {
        self.cache.clear_including_schemas();
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

fn texts(sql: impl IntoIterator<Item = String>) -> Vec<CompiledStatement> {
    sql.into_iter().map(CompiledStatement::text).collect()
}

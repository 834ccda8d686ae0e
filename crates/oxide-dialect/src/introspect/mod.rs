//! Schema introspection.
//!
//! A [`SchemaIntrospector`] reads live metadata through a caller-supplied
//! [`MetadataSource`] and caches it on the dialect instance. Repeated
//! requests for the same tables hit the cache; misses fetch only the
//! tables not yet cached.
//!
//! ```rust,ignore
//! let introspector = dialect.introspector(&source);
//! let columns = introspector.columns(&["users", "posts"])?;
//! introspector.invalidate();
//! ```

mod cache;
mod metadata;

use std::collections::HashMap;

use tracing::debug;

pub use cache::SchemaCache;
pub use metadata::{
    ColumnMetadata, MetadataSource, PrimaryKeyMetadata, RawColumn, RawForeignKeyColumn,
    RawIndexColumn, RawPrimaryKeyColumn,
};

use crate::ast::{ForeignKeyConstraint, Index};
use crate::dialect::Dialect;
use crate::error::{DialectError, Result};
use cache::TableCache;

/// Read-through view of a database schema for one dialect.
pub struct SchemaIntrospector<'d, S> {
    dialect: &'d Dialect,
    source: &'d S,
}

impl<'d, S: MetadataSource> SchemaIntrospector<'d, S> {
    #[must_use]
    pub const fn new(dialect: &'d Dialect, source: &'d S) -> Self {
        Self { dialect, source }
    }

    /// Name as the catalog stores it.
    fn normalize(&self, name: &str) -> String {
        self.dialect.identifiers().in_database_case(name)
    }

    fn fetch_error(tables: &[String], source: S::Error) -> DialectError {
        DialectError::MetadataFetch {
            tables: tables.to_vec(),
            source: Box::new(source),
        }
    }

    /// Looks up `tables` in `cache`, fetching the missing ones with `fetch`.
    ///
    /// The result is keyed by the names as the caller spelled them. Every
    /// requested table gets an entry, empty when the catalog has nothing.
    fn read_through<T: Clone + Default>(
        &self,
        what: &'static str,
        cache: &TableCache<T>,
        tables: &[&str],
        fetch: impl FnOnce(&[String]) -> Result<HashMap<String, T>>,
    ) -> Result<HashMap<String, T>> {
        let keys: Vec<String> = tables.iter().map(|t| self.normalize(t)).collect();
        let (mut found, missing, generation) = cache.lookup(&keys);
        if missing.is_empty() {
            debug!(dialect = self.dialect.name(), what, tables = ?keys, "Metadata cache hit");
        } else {
            debug!(dialect = self.dialect.name(), what, tables = ?missing, "Metadata cache miss");
            let mut fetched = fetch(&missing)?;
            let entries: HashMap<String, T> = missing
                .iter()
                .map(|t| (t.clone(), fetched.remove(t).unwrap_or_default()))
                .collect();
            found.extend(entries.clone());
            if !cache.store(generation, entries) {
                debug!(
                    dialect = self.dialect.name(),
                    what,
                    "Metadata cache cleared during fetch, result not cached"
                );
            }
        }
        Ok(tables
            .iter()
            .zip(&keys)
            .map(|(requested, key)| {
                (
                    (*requested).to_owned(),
                    found.get(key).cloned().unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Tables of the configured default schema.
    ///
    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn tables(&self) -> Result<Vec<String>> {
        let cache = &self.dialect.cache().tables;
        let generation = match cache.lookup() {
            Ok(tables) => {
                debug!(dialect = self.dialect.name(), "Table list cache hit");
                return Ok(tables);
            }
            Err(generation) => generation,
        };
        let schema = self.dialect.config().default_schema.as_deref();
        let tables = self
            .source
            .tables(schema)
            .map_err(|e| Self::fetch_error(&[], e))?;
        cache.store(generation, tables.clone());
        Ok(tables)
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn schemas(&self) -> Result<Vec<String>> {
        let cache = &self.dialect.cache().schemas;
        let generation = match cache.lookup() {
            Ok(schemas) => return Ok(schemas),
            Err(generation) => generation,
        };
        let schemas = self
            .source
            .schemas()
            .map_err(|e| Self::fetch_error(&[], e))?;
        cache.store(generation, schemas.clone());
        Ok(schemas)
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn sequences(&self) -> Result<Vec<String>> {
        let cache = &self.dialect.cache().sequences;
        let generation = match cache.lookup() {
            Ok(sequences) => return Ok(sequences),
            Err(generation) => generation,
        };
        let schema = self.dialect.config().default_schema.as_deref();
        let sequences = self
            .source
            .sequences(schema)
            .map_err(|e| Self::fetch_error(&[], e))?;
        cache.store(generation, sequences.clone());
        Ok(sequences)
    }

    /// Columns per table, in catalog order.
    ///
    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] naming the tables that were fetched.
    pub fn columns(&self, tables: &[&str]) -> Result<HashMap<String, Vec<ColumnMetadata>>> {
        let types = self.dialect.types();
        self.read_through("columns", &self.dialect.cache().columns, tables, |missing| {
            let rows = self
                .source
                .columns(missing)
                .map_err(|e| Self::fetch_error(missing, e))?;
            let mut grouped: HashMap<String, Vec<ColumnMetadata>> = HashMap::new();
            for row in rows {
                grouped
                    .entry(self.normalize(&row.table))
                    .or_default()
                    .push(ColumnMetadata {
                        name: row.name,
                        type_code: row.type_code,
                        type_name: row.type_name,
                        nullable: row.nullable,
                        size: row.size,
                        scale: row.scale,
                        auto_increment: row.auto_increment,
                        default_value: row.default_value.map(|raw| types.sanitize_default(&raw)),
                    });
            }
            Ok(grouped)
        })
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] naming the tables that were fetched.
    pub fn primary_keys(
        &self,
        tables: &[&str],
    ) -> Result<HashMap<String, Option<PrimaryKeyMetadata>>> {
        self.read_through(
            "primary keys",
            &self.dialect.cache().primary_keys,
            tables,
            |missing| {
                let mut rows = self
                    .source
                    .primary_keys(missing)
                    .map_err(|e| Self::fetch_error(missing, e))?;
                rows.sort_by_key(|r| r.position);
                let mut grouped: HashMap<String, Option<PrimaryKeyMetadata>> = HashMap::new();
                for row in rows {
                    let pk = grouped
                        .entry(self.normalize(&row.table))
                        .or_default()
                        .get_or_insert_with(|| PrimaryKeyMetadata {
                            name: row.name.clone(),
                            columns: Vec::new(),
                        });
                    pk.columns.push(row.column);
                }
                Ok(grouped)
            },
        )
    }

    /// Foreign keys per referencing table. Rows sharing a constraint name
    /// are merged into one composite constraint.
    ///
    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] naming the tables that were fetched.
    pub fn foreign_keys(
        &self,
        tables: &[&str],
    ) -> Result<HashMap<String, Vec<ForeignKeyConstraint>>> {
        let dialect = self.dialect;
        self.read_through(
            "foreign keys",
            &dialect.cache().foreign_keys,
            tables,
            |missing| {
                let mut rows = self
                    .source
                    .foreign_keys(missing)
                    .map_err(|e| Self::fetch_error(missing, e))?;
                rows.sort_by_key(|r| r.position);
                let mut grouped: HashMap<String, Vec<ForeignKeyConstraint>> = HashMap::new();
                for row in rows {
                    let constraints = grouped.entry(self.normalize(&row.from_table)).or_default();
                    let mut fk = ForeignKeyConstraint::new(
                        &row.from_table,
                        &row.from_column,
                        &row.target_table,
                        &row.target_column,
                    )
                    .named(row.name.as_str());
                    fk.on_update = dialect.resolve_reference_option(row.update_rule);
                    fk.on_delete = dialect.resolve_reference_option(row.delete_rule);
                    match constraints.iter_mut().find(|c| c.name == fk.name) {
                        Some(existing) => existing.merge(fk),
                        None => constraints.push(fk),
                    }
                }
                Ok(grouped)
            },
        )
    }

    /// Indices per table, excluding the one backing the primary key.
    ///
    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] naming the tables that were fetched.
    pub fn indices(&self, tables: &[&str]) -> Result<HashMap<String, Vec<Index>>> {
        let primary_keys = self.primary_keys(tables)?;
        let pk_by_key: HashMap<String, PrimaryKeyMetadata> = primary_keys
            .into_iter()
            .filter_map(|(table, pk)| pk.map(|pk| (self.normalize(&table), pk)))
            .collect();
        self.read_through("indices", &self.dialect.cache().indices, tables, |missing| {
            let mut rows = self
                .source
                .indices(missing)
                .map_err(|e| Self::fetch_error(missing, e))?;
            rows.sort_by_key(|r| r.position);
            let mut grouped: HashMap<String, Vec<Index>> = HashMap::new();
            for row in rows {
                let indices = grouped.entry(self.normalize(&row.table)).or_default();
                match indices
                    .iter_mut()
                    .find(|i| i.name.as_deref() == Some(row.name.as_str()))
                {
                    Some(index) => index.columns.push(row.column),
                    None => {
                        let mut index = Index::new(&row.table, &[row.column.as_str()])
                            .named(row.name.as_str());
                        index.unique = row.unique;
                        indices.push(index);
                    }
                }
            }
            for (table, indices) in &mut grouped {
                if let Some(pk) = pk_by_key.get(table) {
                    indices.retain(|index| !backs_primary_key(index, pk));
                }
            }
            Ok(grouped)
        })
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let wanted = self.normalize(table);
        Ok(self
            .tables()?
            .iter()
            .any(|t| self.normalize(t) == wanted))
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let wanted = self.normalize(column);
        let columns = self.columns(&[table])?;
        Ok(columns
            .get(table)
            .is_some_and(|cols| cols.iter().any(|c| self.normalize(&c.name) == wanted)))
    }

    /// # Errors
    ///
    /// [`DialectError::MetadataFetch`] when the collaborator fails.
    pub fn sequence_exists(&self, sequence: &str) -> Result<bool> {
        let wanted = self.normalize(sequence);
        Ok(self
            .sequences()?
            .iter()
            .any(|s| self.normalize(s) == wanted))
    }

    /// Drops every cached entry except the schema list.
    pub fn invalidate(&self) {
        self.dialect.reset_caches();
    }

    pub fn invalidate_including_schemas(&self) {
        self.dialect.reset_schema_caches();
    }
}

fn backs_primary_key(index: &Index, pk: &PrimaryKeyMetadata) -> bool {
    if pk.name.is_some() && index.name == pk.name {
        return true;
    }
    index.unique && index.columns == pk.columns
}

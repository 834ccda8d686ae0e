//! Per-dialect schema metadata cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::metadata::{ColumnMetadata, PrimaryKeyMetadata};
use crate::ast::{ForeignKeyConstraint, Index};

/// Entries plus the number of times they were cleared.
#[derive(Debug)]
struct Generational<T> {
    generation: u64,
    value: T,
}

/// Per-table entries. A table is either absent or fully populated.
///
/// Lookups hand out the generation they saw; results fetched under an
/// older generation are dropped on store, so a clear that lands while a
/// fetch is in flight is never undone.
#[derive(Debug)]
pub(crate) struct TableCache<T> {
    entries: RwLock<Generational<HashMap<String, T>>>,
}

impl<T> Default for TableCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Generational {
                generation: 0,
                value: HashMap::new(),
            }),
        }
    }
}

impl<T: Clone> TableCache<T> {
    /// Splits `tables` into cached entries and the names still missing.
    pub fn lookup(&self, tables: &[String]) -> (HashMap<String, T>, Vec<String>, u64) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut found = HashMap::new();
        let mut missing = Vec::new();
        for table in tables {
            match entries.value.get(table) {
                Some(entry) => {
                    found.insert(table.clone(), entry.clone());
                }
                None if !missing.contains(table) => missing.push(table.clone()),
                None => {}
            }
        }
        (found, missing, entries.generation)
    }

    /// Stores entries fetched after a lookup at `generation`. An entry
    /// written concurrently by another caller is kept. Returns false when
    /// the cache was cleared in between and nothing was stored.
    pub fn store(&self, generation: u64, fetched: HashMap<String, T>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.generation != generation {
            return false;
        }
        for (table, entry) in fetched {
            entries.value.entry(table).or_insert(entry);
        }
        true
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.generation += 1;
        entries.value.clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .len()
    }
}

/// A name list fetched as a whole.
#[derive(Debug)]
pub(crate) struct ListCache {
    names: RwLock<Generational<Option<Vec<String>>>>,
}

impl Default for ListCache {
    fn default() -> Self {
        Self {
            names: RwLock::new(Generational {
                generation: 0,
                value: None,
            }),
        }
    }
}

impl ListCache {
    /// The cached list, or the generation to store a fetched one under.
    pub fn lookup(&self) -> Result<Vec<String>, u64> {
        let slot = self.names.read().unwrap_or_else(PoisonError::into_inner);
        slot.value.clone().ok_or(slot.generation)
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<Vec<String>> {
        self.lookup().ok()
    }

    pub fn store(&self, generation: u64, names: Vec<String>) -> bool {
        let mut slot = self.names.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            return false;
        }
        if slot.value.is_none() {
            slot.value = Some(names);
        }
        true
    }

    pub fn clear(&self) {
        let mut slot = self.names.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.value = None;
    }
}

/// Metadata cached by one dialect instance.
///
/// Only schema metadata is cached, never query results.
#[derive(Debug, Default)]
pub struct SchemaCache {
    pub(crate) columns: TableCache<Vec<ColumnMetadata>>,
    pub(crate) primary_keys: TableCache<Option<PrimaryKeyMetadata>>,
    pub(crate) foreign_keys: TableCache<Vec<ForeignKeyConstraint>>,
    pub(crate) indices: TableCache<Vec<Index>>,
    pub(crate) tables: ListCache,
    pub(crate) sequences: ListCache,
    pub(crate) schemas: ListCache,
}

impl SchemaCache {
    /// Clears everything except the schema list.
    pub fn clear(&self) {
        self.columns.clear();
        self.primary_keys.clear();
        self.foreign_keys.clear();
        self.indices.clear();
        self.tables.clear();
        self.sequences.clear();
    }

    pub fn clear_including_schemas(&self) {
        self.clear();
        self.schemas.clear();
    }

    /// Number of tables with cached columns.
    #[must_use]
    pub fn cached_column_tables(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reports_missing_once() {
        let cache: TableCache<u32> = TableCache::default();
        let mut fetched = HashMap::new();
        fetched.insert(String::from("a"), 1);
        assert!(cache.store(0, fetched));

        let tables = vec![String::from("a"), String::from("b"), String::from("b")];
        let (found, missing, _) = cache.lookup(&tables);
        assert_eq!(found.get("a"), Some(&1));
        assert_eq!(missing, vec![String::from("b")]);
    }

    #[test]
    fn first_writer_wins() {
        let cache: TableCache<u32> = TableCache::default();
        cache.store(0, HashMap::from([(String::from("a"), 1)]));
        cache.store(0, HashMap::from([(String::from("a"), 2)]));
        let (found, _, _) = cache.lookup(&[String::from("a")]);
        assert_eq!(found["a"], 1);
    }

    #[test]
    fn fetch_from_before_a_clear_is_dropped() {
        let cache: TableCache<u32> = TableCache::default();
        let (_, missing, generation) = cache.lookup(&[String::from("a")]);
        assert_eq!(missing.len(), 1);
        cache.clear();
        assert!(!cache.store(generation, HashMap::from([(String::from("a"), 1)])));
        assert_eq!(cache.len(), 0);

        let list = ListCache::default();
        let generation = list.lookup().unwrap_err();
        list.clear();
        assert!(!list.store(generation, vec![String::from("t")]));
        assert!(list.get().is_none());
    }

    #[test]
    fn clear_keeps_schemas() {
        let cache = SchemaCache::default();
        cache.tables.store(0, vec![String::from("t")]);
        cache.schemas.store(0, vec![String::from("public")]);
        cache.clear();
        assert!(cache.tables.get().is_none());
        assert!(cache.schemas.get().is_some());
        cache.clear_including_schemas();
        assert!(cache.schemas.get().is_none());
    }
}

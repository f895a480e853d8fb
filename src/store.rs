use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::record::BookRecord;

// ------------- Catalog -------------
/// One complete, immutable generation of the catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<BookRecord>,
    source: Option<PathBuf>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn new(records: Vec<BookRecord>, source: &Path) -> Self {
        Self {
            records,
            source: Some(source.to_path_buf()),
            loaded_at: Some(Utc::now()),
        }
    }
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

impl From<Vec<BookRecord>> for Catalog {
    fn from(records: Vec<BookRecord>) -> Self {
        Self {
            records,
            source: None,
            loaded_at: Some(Utc::now()),
        }
    }
}

// ------------- CatalogStore -------------
/// Owns the live catalog. Readers take an `Arc` to the current generation
/// and keep it for as long as they like; a replace only swaps the pointer.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `catalog` as the live generation and hands back the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        // the guarded value is always a whole Arc, so a poisoned lock holds nothing torn
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(name: &str) -> BookRecord {
        BookRecord {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn starts_empty() {
        let store = CatalogStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().loaded_at().is_none());
    }

    #[test]
    fn held_snapshots_survive_a_replace() {
        let store = CatalogStore::new();
        store.replace(Catalog::from(vec![book("a"), book("b")]));
        let before = store.snapshot();
        let previous = store.replace(Catalog::from(vec![book("c")]));
        assert_eq!(before.len(), 2);
        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(store.snapshot().records()[0].name, "c");
    }
}

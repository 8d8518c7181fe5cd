use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{load_file, LoadError};
use super::model::TransactionTable;

// ---------------------------------------------------------------------------
// TableCache – loaded tables keyed by file path
// ---------------------------------------------------------------------------

/// Memoizes [`load_file`] so re-selecting a year does not re-read its file.
///
/// Entries live until [`TableCache::invalidate`] or [`TableCache::clear`].
/// Failed loads are not cached.
#[derive(Debug)]
pub struct TableCache {
    chunk_size: usize,
    tables: HashMap<PathBuf, Arc<TransactionTable>>,
}

impl TableCache {
    pub fn new(chunk_size: usize) -> Self {
        TableCache {
            chunk_size,
            tables: HashMap::new(),
        }
    }

    /// Return the cached table for `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<TransactionTable>, LoadError> {
        if let Some(table) = self.tables.get(path) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_file(path, self.chunk_size)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    /// Drop one entry so the next access re-reads the file.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.tables.remove(path).is_some();
        if removed {
            log::info!("Invalidated cached table for {}", path.display());
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.tables.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::write_year_csv;
    use crate::data::loader::DEFAULT_CHUNK_SIZE;

    #[test]
    fn second_access_returns_the_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_year_csv(dir.path(), "full_2020.csv", &[&[("type_local", "Maison")]]);
        let mut cache = TableCache::new(DEFAULT_CHUNK_SIZE);

        let first = cache.get_or_load(&path).unwrap();
        // The file is gone but the cached table is still served.
        std::fs::remove_file(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_forces_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_year_csv(dir.path(), "full_2019.csv", &[&[("type_local", "Maison")]]);
        let mut cache = TableCache::new(DEFAULT_CHUNK_SIZE);
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 1);

        write_year_csv(
            dir.path(),
            "full_2019.csv",
            &[&[("type_local", "Maison")], &[("type_local", "Appartement")]],
        );
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 1);

        assert!(cache.invalidate(&path));
        assert!(!cache.contains(&path));
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 2);
        assert!(!cache.invalidate(&dir.path().join("full_2016.csv")));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2018.csv");
        let mut cache = TableCache::new(DEFAULT_CHUNK_SIZE);

        assert!(matches!(cache.get_or_load(&path), Err(LoadError::Missing(_))));
        assert!(cache.is_empty());

        write_year_csv(dir.path(), "full_2018.csv", &[]);
        assert!(cache.get_or_load(&path).unwrap().is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}

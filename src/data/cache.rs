//! Load-once cache for the raw dataset.
//!
//! The cache is keyed on the identity of the source file: its canonical path,
//! modification time and size. A repeated request for an unchanged file hands
//! back the same shared table without touching the CSV again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::data::loader::{self, RawTable};
use crate::error::DataSourceError;

/// Identity of a source file at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self, DataSourceError> {
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }

        let io_err = |source| DataSourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_err)?;
        let meta = std::fs::metadata(&canonical).map_err(io_err)?;

        Ok(Self {
            path: canonical,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CacheEntry {
    key: SourceKey,
    table: Arc<RawTable>,
}

/// Owns the memoized raw table for one dashboard session.
pub struct RawDataCache {
    entry: Option<CacheEntry>,
    preview_rows: usize,
    loads: usize,
}

impl Default for RawDataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RawDataCache {
    pub fn new() -> Self {
        Self {
            entry: None,
            preview_rows: 5,
            loads: 0,
        }
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Return the cached table for `path`, reading the file only when it has
    /// not been read yet or has changed since.
    ///
    /// A failed load leaves the cache empty.
    pub fn get_or_load(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Arc<RawTable>, DataSourceError> {
        let path = path.as_ref();
        let key = match SourceKey::for_path(path) {
            Ok(key) => key,
            Err(e) => {
                self.entry = None;
                return Err(e);
            }
        };

        if let Some(entry) = &self.entry {
            if entry.key == key {
                debug!("Raw data cache hit for {}", key.path.display());
                return Ok(Arc::clone(&entry.table));
            }
            info!("Source {} changed, reloading", key.path.display());
        }

        self.entry = None;
        let table = Arc::new(loader::load_with_preview(&key.path, self.preview_rows)?);
        self.loads += 1;
        self.entry = Some(CacheEntry {
            key,
            table: Arc::clone(&table),
        });

        Ok(table)
    }

    /// True when a request for `path` would be served without reading it.
    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        let Some(entry) = &self.entry else {
            return false;
        };
        SourceKey::for_path(path.as_ref())
            .map(|key| key == entry.key)
            .unwrap_or(false)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Number of times the file has actually been read.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

//! Time-bounded read-through cache of loaded sheets

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheConfig;
use crate::reader::Table;

type CacheKey = (PathBuf, String);

#[derive(Debug)]
struct CacheEntry {
    loaded_at: Instant,
    /// `None` records a failed load so it is not retried until expiry
    table: Option<Arc<Table>>,
}

/// Sheet cache keyed by `(workbook path, sheet name)`
///
/// Readers never mutate cached tables, so entries are shared as `Arc`s.
/// A sheet TTL of zero bypasses the cache entirely.
#[derive(Debug)]
pub struct SheetCache {
    ttl: Duration,
    sheet_ttls: HashMap<String, Duration>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sheet_ttls: HashMap::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(config.ttl());
        cache.sheet_ttls = config.sheet_ttls();
        cache
    }

    /// Override the lifetime for one sheet name
    pub fn with_sheet_ttl(mut self, sheet: &str, ttl: Duration) -> Self {
        self.sheet_ttls.insert(sheet.to_string(), ttl);
        self
    }

    pub fn ttl_for(&self, sheet: &str) -> Duration {
        self.sheet_ttls.get(sheet).copied().unwrap_or(self.ttl)
    }

    /// Return the cached sheet or call `load` and remember its result
    pub fn get_or_load<F>(&self, path: &Path, sheet: &str, load: F) -> Option<Arc<Table>>
    where
        F: FnOnce(&Path, &str) -> Option<Table>,
    {
        self.get_or_load_at(Instant::now(), path, sheet, load)
    }

    /// Same as [`get_or_load`](Self::get_or_load) with an explicit clock reading
    pub fn get_or_load_at<F>(
        &self,
        now: Instant,
        path: &Path,
        sheet: &str,
        load: F,
    ) -> Option<Arc<Table>>
    where
        F: FnOnce(&Path, &str) -> Option<Table>,
    {
        let ttl = self.ttl_for(sheet);
        if ttl.is_zero() {
            debug!(sheet, "cache bypassed");
            return load(path, sheet).map(Arc::new);
        }

        let key = (path.to_path_buf(), sheet.to_string());
        if let Some(entry) = self.lock().get(&key) {
            if now.saturating_duration_since(entry.loaded_at) < ttl {
                debug!(sheet, "cache hit");
                return entry.table.clone();
            }
        }

        debug!(sheet, "cache miss");
        let table = load(path, sheet).map(Arc::new);
        self.lock().insert(
            key,
            CacheEntry {
                loaded_at: now,
                table: table.clone(),
            },
        );
        table
    }

    /// Drop one entry so the next read goes to disk
    pub fn invalidate(&self, path: &Path, sheet: &str) {
        self.lock()
            .remove(&(path.to_path_buf(), sheet.to_string()));
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // Entries are inserted whole, so a poisoned map is still usable
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SheetCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

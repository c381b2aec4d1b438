use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use vanet_core::Location;

use crate::route::Path;

/// Cache key for a routing problem: both endpoints rounded to 0.1 m.
///
/// Two requests with the same rounded endpoints are treated as the same
/// problem regardless of the neighbor snapshot.
pub fn route_key(source: &Location, destination: &Location) -> String {
    format!("{}->{}", source.key(), destination.key())
}

/// Point-in-time counters for a [`RouteCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// A concurrent path cache backed by DashMap.
///
/// Each strategy owns one cache. Lookups are counted so callers can tell a
/// cached answer from a fresh computation.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: DashMap<String, Path>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RouteCache {
    /// Create a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached path.
    pub fn get(&self, key: &str) -> Option<Path> {
        let found = self.entries.get(key).map(|entry| entry.value().clone());
        self.record(found.is_some());
        found
    }

    /// Look up a cached path and drop it if `is_valid` rejects it.
    ///
    /// A dropped entry counts as a miss.
    pub fn get_valid<F>(&self, key: &str, is_valid: F) -> Option<Path>
    where
        F: FnOnce(&Path) -> bool,
    {
        // Clone out before removing so no shard guard is held across the remove.
        let cached = self.entries.get(key).map(|entry| entry.value().clone());
        let result = match cached {
            Some(path) if is_valid(&path) => Some(path),
            Some(_) => {
                self.entries.remove(key);
                tracing::debug!(key, "dropped stale cached route");
                None
            }
            None => None,
        };
        self.record(result.is_some());
        result
    }

    /// Insert or overwrite a path. Returns the previous one for the key.
    pub fn put(&self, key: String, path: Path) -> Option<Path> {
        self.entries.insert(key, path)
    }

    /// Remove a single entry.
    pub fn invalidate(&self, key: &str) -> Option<Path> {
        self.entries.remove(key).map(|(_, path)| path)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Remove every entry for which `keep` returns false.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&str, &Path) -> bool,
    {
        self.entries.retain(|key, path| keep(key, path));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

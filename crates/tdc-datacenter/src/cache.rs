//! Per-coordinate memoization of decoded records.

use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;

use crate::{Coordinate, Result};

type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Hit/miss counters of a [`LazyCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Thread-safe cache of decoded values keyed by [`Coordinate`].
///
/// Decoding happens outside the lock. When two threads miss on the same
/// coordinate at once both decode, and the first insert is the one retained.
pub struct LazyCache<T> {
    entries: RwLock<FxHashMap<Coordinate, T>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T: Clone> LazyCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Return the cached value for `key`, decoding it with `decode` on first use.
    ///
    /// A failed decode caches nothing.
    pub fn get_or_try_insert_with<F>(&self, key: Coordinate, decode: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value.clone());
        }

        let value = decode()?;
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        Ok(entries.entry(key).or_insert(value).clone())
    }

    #[cfg(test)]
    pub fn get(&self, key: Coordinate) -> Option<T> {
        self.entries.read().get(&key).cloned()
    }

    #[cfg(test)]
    pub fn contains(&self, key: Coordinate) -> bool {
        self.entries.read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<T: Clone> Default for LazyCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LazyCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyCache")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

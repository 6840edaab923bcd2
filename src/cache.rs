//! Bounded least-recently-used cache of finished analyses.
//!
//! One mutex guards the whole `LruCache`, so a lookup, its recency update, an
//! insertion and the eviction it causes are atomic with respect to each other.
//!
//! The lock is *not* held while a missing result is computed. Two threads that
//! miss on the same key both run the analysis and the later insert replaces
//! the earlier, value-equal entry. There is no single-flight collapsing.

use crate::AnalysisResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Raw input -> immutable result snapshot.
#[derive(Debug)]
pub struct ResultCache {
    /// `None` when caching is disabled (capacity 0).
    entries: Option<Mutex<LruCache<String, Arc<AnalysisResult>>>>,
}

impl ResultCache {
    /// A cache holding at most `capacity` entries; `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        ResultCache { entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))) }
    }

    pub fn capacity(&self) -> usize {
        self.lock().map_or(0, |cache| cache.cap().get())
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached result for `key`, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<Arc<AnalysisResult>> {
        self.lock()?.get(key).cloned()
    }

    /// Whether `key` is cached, without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().is_some_and(|cache| cache.contains(key))
    }

    pub fn insert(&self, key: &str, result: Arc<AnalysisResult>) {
        if let Some(mut cache) = self.lock() {
            if let Some((evicted, _)) = cache.push(key.to_string(), result) {
                if evicted != key {
                    tracing::debug!(evicted = %evicted, "cache eviction");
                }
            }
        }
    }

    /// Return the cached result for `key` or compute, store and return it.
    pub fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> AnalysisResult) -> Arc<AnalysisResult> {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let result = Arc::new(compute());
        self.insert(key, Arc::clone(&result));
        result
    }

    pub fn clear(&self) {
        if let Some(mut cache) = self.lock() {
            cache.clear();
        }
    }

    /// Entries are immutable snapshots, so a poisoned lock is still usable.
    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, Arc<AnalysisResult>>>> {
        self.entries.as_ref().map(|m| m.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result(value: &str) -> AnalysisResult {
        let mut fields = BTreeMap::new();
        fields.insert("F".to_string(), FieldValue { value: value.to_string(), confidence: 1 });
        AnalysisResult::from_fields(fields)
    }

    #[test]
    fn hits_are_not_recomputed() {
        let cache = ResultCache::new(4);
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            result("a")
        };

        let first = cache.get_or_insert_with("ua", compute);
        let second = cache.get_or_insert_with("ua", compute);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.value("F"), Some("a"));
    }

    #[test]
    fn least_recently_accessed_is_evicted_first() {
        let cache = ResultCache::new(3);
        for key in ["a", "b", "c"] {
            cache.insert(key, Arc::new(result(key)));
        }
        // Access order now: b, c, a (a most recent).
        assert!(cache.get("a").is_some());

        cache.insert("d", Arc::new(result("d")));
        assert!(!cache.contains("b"));
        assert!(cache.contains("a") && cache.contains("c") && cache.contains("d"));

        cache.insert("e", Arc::new(result("e")));
        assert!(!cache.contains("c"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn contains_does_not_refresh_recency() {
        let cache = ResultCache::new(2);
        cache.insert("a", Arc::new(result("a")));
        cache.insert("b", Arc::new(result("b")));
        assert!(cache.contains("a"));
        cache.insert("c", Arc::new(result("c")));
        assert!(!cache.contains("a"));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ResultCache::new(0);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            cache.get_or_insert_with("ua", || {
                calls.fetch_add(1, Ordering::SeqCst);
                result("a")
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!cache.is_enabled());
        assert_eq!(cache.capacity(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = ResultCache::new(2);
        cache.insert("a", Arc::new(result("a")));
        cache.clear();
        assert!(cache.get("a").is_none());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn concurrent_readers_share_one_cache() {
        let cache = Arc::new(ResultCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let key = format!("ua-{}", i % 4);
                    cache.get_or_insert_with(&key, || result(&key)).value("F").map(str::to_string)
                })
            })
            .collect();
        for handle in handles {
            let value = handle.join().unwrap();
            assert!(value.is_some_and(|v| v.starts_with("ua-")));
        }
        assert_eq!(cache.len(), 4);
    }
}

//! Process-local cache store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CacheEntry, CacheStore};
use crate::error::CacheError;

/// In-memory store guarded by a mutex. Expired entries are evicted lazily
/// on lookup.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prepared entry, replacing any entry with the same fingerprint.
    pub fn insert(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.lock()?.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }

    /// Number of stored entries, including ones not yet evicted.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Poisoned(e.to_string()))
    }
}

impl CacheStore for MemoryCache {
    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.annotated_text.clone())),
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        self.insert(CacheEntry::new(key, value, ttl_seconds))?;
        Ok(true)
    }

    fn clear(&self) -> Result<bool, CacheError> {
        self.lock()?.clear();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_set_and_get() {
        let cache = MemoryCache::new();
        assert!(cache.set("key", "value", 60).unwrap());
        assert!(cache.has("key").unwrap());
        assert_eq!(cache.get("key").unwrap(), Some("value".to_string()));
        assert_eq!(cache.get("other").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("key", "first", 60).unwrap();
        cache.set("key", "second", 120).unwrap();
        assert_eq!(cache.get("key").unwrap(), Some("second".to_string()));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = MemoryCache::new();
        let mut entry = CacheEntry::new("key", "value", 60);
        entry.inserted_at = Utc::now() - Duration::seconds(61);
        cache.insert(entry).unwrap();

        assert!(!cache.has("key").unwrap());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", "1", 60).unwrap();
        cache.set("b", "2", 60).unwrap();
        assert!(cache.clear().unwrap());
        assert!(cache.is_empty().unwrap());
    }
}

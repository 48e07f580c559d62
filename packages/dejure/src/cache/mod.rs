//! Cache stores for annotated texts.
//!
//! The pipeline only relies on the [`CacheStore`] contract. Two backends
//! ship with the crate:
//!
//! - [`MemoryCache`]: process-local, used by default and in tests
//! - [`FileCache`]: one JSON file per entry below a storage directory

pub mod file;
pub mod memory;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, ConfigError, Result};

pub use file::FileCache;
pub use memory::MemoryCache;

/// Default storage directory for file-backed caches.
pub const DEFAULT_CACHE_DIR: &str = "./.cache";

/// Key/value store with per-entry expiry.
///
/// Implementations own eviction: an expired entry must behave exactly like
/// a missing one. Implementations shared between threads must be safe
/// under concurrent access.
pub trait CacheStore: Send + Sync {
    /// Whether a live entry exists for `key`.
    fn has(&self, key: &str) -> std::result::Result<bool, CacheError>;

    /// Value of the live entry for `key`, if any.
    fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// A `ttl_seconds` of zero stores the entry without expiry.
    fn set(&self, key: &str, value: &str, ttl_seconds: u64)
        -> std::result::Result<bool, CacheError>;

    /// Remove all entries.
    fn clear(&self) -> std::result::Result<bool, CacheError>;
}

impl<T: CacheStore + ?Sized> CacheStore for Box<T> {
    fn has(&self, key: &str) -> std::result::Result<bool, CacheError> {
        (**self).has(key)
    }

    fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> std::result::Result<bool, CacheError> {
        (**self).set(key, value, ttl_seconds)
    }

    fn clear(&self) -> std::result::Result<bool, CacheError> {
        (**self).clear()
    }
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn has(&self, key: &str) -> std::result::Result<bool, CacheError> {
        (**self).has(key)
    }

    fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> std::result::Result<bool, CacheError> {
        (**self).set(key, value, ttl_seconds)
    }

    fn clear(&self) -> std::result::Result<bool, CacheError> {
        (**self).clear()
    }
}

/// A stored annotation result. Written once, replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub annotated_text: String,
    pub inserted_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    /// Create an entry inserted now.
    pub fn new(
        fingerprint: impl Into<String>,
        annotated_text: impl Into<String>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            annotated_text: annotated_text.into(),
            inserted_at: Utc::now(),
            ttl_seconds,
        }
    }

    /// Point in time after which the entry is no longer served.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.ttl_seconds == 0 {
            return None;
        }
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        Duration::try_seconds(ttl).and_then(|d| self.inserted_at.checked_add_signed(d))
    }

    /// Whether the entry has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Available cache backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheDriver {
    #[default]
    Memory,
    File,
}

impl CacheDriver {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
        }
    }

    /// Open a store for this driver.
    ///
    /// `storage` is only used by file-backed stores and is created if it
    /// does not exist yet.
    pub fn open(&self, storage: &Path) -> Result<Box<dyn CacheStore>> {
        let store: Box<dyn CacheStore> = match self {
            Self::Memory => Box::new(MemoryCache::new()),
            Self::File => Box::new(FileCache::open(storage)?),
        };
        tracing::debug!(driver = self.as_str(), "Opened cache store");
        Ok(store)
    }
}

impl FromStr for CacheDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            _ => Err(ConfigError::UnsupportedCacheDriver(s.to_string())),
        }
    }
}

//! File-backed cache store.
//!
//! Each entry is a JSON-serialized [`CacheEntry`] in its own file below the
//! storage directory. Writes go through a temp file and a rename, so
//! readers never observe a partially written entry.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CacheEntry, CacheStore};
use crate::error::CacheError;

/// Extension of entry files.
const ENTRY_EXTENSION: &str = "json";

/// Extension of in-flight writes.
const TEMP_EXTENSION: &str = "tmp";

/// Prefix of hex-encoded file stems. Never part of a key used as-is.
const ENCODED_PREFIX: char = '~';

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create `dir` and all missing parents.
///
/// Succeeds without doing anything if the directory already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), CacheError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    tracing::debug!(dir = %dir.display(), "Created cache directory");
    Ok(())
}

/// Cache store keeping one file per entry.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open a store below `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Storage directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXTENSION}", file_stem(key)))
    }

    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                // Corrupt entries are dropped instead of poisoning the key
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable cache entry");
                remove_if_exists(&path)?;
                return Ok(None);
            }
        };

        if entry.is_expired() {
            remove_if_exists(&path)?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let output_file = self.entry_path(key);
        let temp_file = self.dir.join(format!(
            ".{}.{}.{}.{TEMP_EXTENSION}",
            file_stem(key),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let content = serde_json::to_string(entry)?;

        let written = (|| -> Result<(), CacheError> {
            {
                let mut file = File::create(&temp_file)?;
                file.write_all(content.as_bytes())?;
                file.sync_all()?;
            }

            // On Windows, rename fails if the destination already exists
            #[cfg(target_os = "windows")]
            remove_if_exists(&output_file)?;

            fs::rename(&temp_file, &output_file)?;
            Ok(())
        })();

        if written.is_err() {
            if let Err(e) = remove_if_exists(&temp_file) {
                tracing::warn!(
                    path = %temp_file.display(),
                    error = %e,
                    "Failed to remove temp file"
                );
            }
        }
        written
    }
}

impl CacheStore for FileCache {
    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.read_entry(key)?.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.read_entry(key)?.map(|entry| entry.annotated_text))
    }

    fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        self.write_entry(key, &CacheEntry::new(key, value, ttl_seconds))?;
        Ok(true)
    }

    fn clear(&self) -> Result<bool, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        for dir_entry in entries {
            let path = dir_entry?.path();
            if path
                .extension()
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION)
            {
                remove_if_exists(&path)?;
            }
        }
        Ok(true)
    }
}

/// File name for a key. Fingerprints are used as-is; anything containing
/// characters outside `[A-Za-z0-9_-]` is hex-encoded behind `~`, so the
/// two forms cannot collide.
fn file_stem(key: &str) -> String {
    if !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        key.to_string()
    } else {
        format!("{ENCODED_PREFIX}{}", hex::encode(key.as_bytes()))
    }
}

fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

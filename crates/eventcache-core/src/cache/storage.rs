//! Key-value storage backends.
//!
//! The `Storage` trait mirrors the browser `localStorage` surface: string
//! keys, string values, and no transactions. Every call stands alone.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    /// Value stored under `key`, or `None` if the key was never set.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Time of the last write to `key`, when the backend tracks it.
    fn modified(&self, _key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

/// One file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("Invalid storage key: {:?}", key));
        }
        Ok(self.dir.join(key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage item: {}", key))?;
        Ok(Some(contents))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write storage item: {}", key))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage item: {}", key))?;
        }
        Ok(())
    }

    fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time: {}", key))?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}

/// In-process storage. Nothing survives the process; useful for tests and
/// for running without a cache directory.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, DateTime<Utc>)>>> {
        self.items
            .lock()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).map(|(value, _)| value.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?
            .insert(key.to_string(), (value.to_string(), Utc::now()));
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }

    fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.items()?.get(key).map(|(_, at)| *at))
    }
}

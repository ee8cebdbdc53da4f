use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::Storage;
use crate::models::{ParticipantEvents, Signature};

/// Storage key for the last seen update signature (raw string).
pub const LAST_UPDATE_KEY: &str = "lastUpdate";

/// Storage key for the participant name list (JSON array).
pub const PARTICIPANTS_KEY: &str = "participants";

/// Storage key for the most recent event fetch (JSON object).
pub const LAST_EVENT_FETCH_KEY: &str = "lastEventFetch";

/// Typed access to the three persisted entities.
#[derive(Clone)]
pub struct CacheManager {
    storage: Arc<dyn Storage>,
}

impl CacheManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load a JSON value. A missing key and a stored `null` both yield `None`;
    /// anything else that fails to parse is an error.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(contents) = self.storage.get_item(key)? else {
            return Ok(None);
        };

        let parsed: Option<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cached value: {}", key))?;

        Ok(parsed)
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let contents = serde_json::to_string(data)?;
        self.storage.set_item(key, &contents)
    }

    // ===== Last Update =====

    pub fn load_last_update(&self) -> Result<Signature> {
        Ok(self
            .storage
            .get_item(LAST_UPDATE_KEY)?
            .map(Signature::new)
            .unwrap_or_default())
    }

    pub fn save_last_update(&self, signature: &Signature) -> Result<()> {
        self.storage.set_item(LAST_UPDATE_KEY, signature.as_str())
    }

    pub fn clear_last_update(&self) -> Result<()> {
        self.storage.remove_item(LAST_UPDATE_KEY)
    }

    // ===== Participants =====

    pub fn load_participants(&self) -> Result<Vec<String>> {
        Ok(self.load(PARTICIPANTS_KEY)?.unwrap_or_default())
    }

    pub fn save_participants(&self, names: &[String]) -> Result<()> {
        self.save(PARTICIPANTS_KEY, names)
    }

    // ===== Last Event Fetch =====

    pub fn load_last_event_fetch(&self) -> Result<Option<ParticipantEvents>> {
        self.load(LAST_EVENT_FETCH_KEY)
    }

    pub fn save_last_event_fetch(&self, events: &ParticipantEvents) -> Result<()> {
        self.save(LAST_EVENT_FETCH_KEY, events)
    }

    // ===== Cache Age Information =====

    /// Helper to read a modification time and log errors without failing
    fn load_age(&self, key: &str) -> Option<String> {
        match self.storage.modified(key) {
            Ok(Some(at)) => Some(age_display(at)),
            Ok(None) => None,
            Err(e) => {
                warn!(cache = key, error = %e, "Failed to read cache age");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        let ages = CacheAges {
            last_update: self.load_age(LAST_UPDATE_KEY),
            participants: self.load_age(PARTICIPANTS_KEY),
            events: self.load_age(LAST_EVENT_FETCH_KEY),
        };
        debug!(?ages, "Cache ages computed");
        ages
    }
}

pub fn age_minutes(cached_at: DateTime<Utc>) -> i64 {
    (Utc::now() - cached_at).num_minutes()
}

pub fn age_display(cached_at: DateTime<Utc>) -> String {
    let minutes = age_minutes(cached_at);
    if minutes < 1 {
        // Also covers clock skew (negative ages)
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub last_update: Option<String>,
    pub participants: Option<String>,
    pub events: Option<String>,
}

impl CacheAges {
    pub fn participants_age(&self) -> String {
        self.participants
            .clone()
            .unwrap_or_else(|| "never".to_string())
    }

    pub fn events_age(&self) -> String {
        self.events.clone().unwrap_or_else(|| "never".to_string())
    }

    /// When the server version was last checked successfully
    pub fn last_checked(&self) -> String {
        self.last_update
            .clone()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Cached fetch client.
//!
//! `CachedFetchClient` keeps the participant list and the most recent
//! participant event fetch in persistent storage, and only goes back to the
//! network when the server's last-update signature changes (or the list is
//! empty). Listeners are told whenever event data is fetched or re-delivered
//! and whenever a fresh participant list arrives.
//!
//! All mutating operations take the same async mutex for their whole
//! duration, network round trips included, so concurrent calls run one
//! after another in the order they acquired the lock.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::cache::{CacheManager, Storage};
use crate::models::{ParticipantEvents, Signature};

type EventListener = Box<dyn Fn(&ParticipantEvents) + Send + Sync>;
type ParticipantsListener = Box<dyn Fn(&[String]) + Send + Sync>;

/// When cached event data reaches listeners before a network response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Deliver cached events as soon as the client is built, and send a
    /// `{name, events: []}` placeholder before each event fetch.
    #[default]
    Eager,
    /// Cached events are first delivered by the next `update()`; no
    /// placeholder is sent.
    Deferred,
}

#[derive(Default)]
struct Listeners {
    events: Vec<EventListener>,
    participants: Vec<ParticipantsListener>,
}

impl Listeners {
    fn notify_events(&self, events: &ParticipantEvents) {
        for listener in &self.events {
            listener(events);
        }
    }

    fn notify_participants(&self, names: &[String]) {
        for listener in &self.participants {
            listener(names);
        }
    }
}

/// In-memory copy of the persisted entities.
#[derive(Debug, Default)]
struct ClientState {
    last_update: Signature,
    participants: Vec<String>,
    last_event_fetch: Option<ParticipantEvents>,
}

impl ClientState {
    fn load(cache: &CacheManager) -> Result<Self> {
        Ok(Self {
            last_update: cache.load_last_update()?,
            participants: cache.load_participants()?,
            last_event_fetch: cache.load_last_event_fetch()?,
        })
    }
}

/// Builder for [`CachedFetchClient`]. Listeners run in registration order.
pub struct ClientBuilder {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    delivery: DeliveryMode,
    listeners: Listeners,
}

impl ClientBuilder {
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            api,
            storage,
            delivery: DeliveryMode::default(),
            listeners: Listeners::default(),
        }
    }

    pub fn delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Called whenever the event cache changes or is re-delivered.
    pub fn on_event_fetch<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ParticipantEvents) + Send + Sync + 'static,
    {
        self.listeners.events.push(Box::new(listener));
        self
    }

    /// Called only when a participant list is freshly fetched.
    pub fn on_update_participants<F>(mut self, listener: F) -> Self
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        self.listeners.participants.push(Box::new(listener));
        self
    }

    /// Load persisted state and build the client.
    ///
    /// Fails if a stored value is present but cannot be parsed.
    pub fn build(self) -> Result<CachedFetchClient> {
        let cache = CacheManager::new(self.storage);
        let state = ClientState::load(&cache).context("Failed to load cached client state")?;
        debug!(
            last_update = %state.last_update,
            participants = state.participants.len(),
            has_events = state.last_event_fetch.is_some(),
            "Loaded cached state"
        );

        if self.delivery == DeliveryMode::Eager {
            if let Some(ref events) = state.last_event_fetch {
                self.listeners.notify_events(events);
            }
        }

        Ok(CachedFetchClient {
            api: self.api,
            cache,
            delivery: self.delivery,
            listeners: self.listeners,
            state: Mutex::new(state),
        })
    }
}

pub struct CachedFetchClient {
    api: ApiClient,
    cache: CacheManager,
    delivery: DeliveryMode,
    listeners: Listeners,
    state: Mutex<ClientState>,
}

impl CachedFetchClient {
    pub fn builder(api: ApiClient, storage: Arc<dyn Storage>) -> ClientBuilder {
        ClientBuilder::new(api, storage)
    }

    /// Check the server signature and refresh whatever it invalidates.
    pub async fn update(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.run_update(&mut state).await
    }

    /// Forget the stored signature, then update. The comparison in that
    /// update mismatches unless the server itself reports `"never"`.
    pub async fn force_update(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.cache.clear_last_update()?;
        state.last_update = Signature::never();
        info!("Forcing update");
        self.run_update(&mut state).await
    }

    /// Fetch one participant's events, replacing whatever was cached.
    pub async fn fetch_events(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        if self.delivery == DeliveryMode::Eager {
            self.listeners
                .notify_events(&ParticipantEvents::placeholder(name));
        }

        info!(name, "Fetching participant events");
        let events = self.api.fetch_events(name).await?;
        let events = state.last_event_fetch.insert(events);

        self.cache.save_last_event_fetch(events)?;
        self.listeners.notify_events(events);
        Ok(())
    }

    async fn run_update(&self, state: &mut ClientState) -> Result<()> {
        let server = self.api.fetch_last_update().await?;

        if state.last_update != server {
            debug!(
                server = %server,
                local = %state.last_update,
                "Server version mismatches local, clearing cache"
            );
            state.participants.clear();
            state.last_event_fetch = None;
        }

        if state.participants.is_empty() {
            info!("Fetching participant list");
            state.participants = self.api.fetch_participants().await?;
            self.cache.save_participants(&state.participants)?;
            self.listeners.notify_participants(&state.participants);
        } else {
            debug!(count = state.participants.len(), "Participant list is current");
        }

        if let Some(ref events) = state.last_event_fetch {
            self.listeners.notify_events(events);
        }

        self.cache.save_last_update(&server)?;
        state.last_update = server;
        Ok(())
    }

    // ===== Snapshots =====

    pub async fn participants(&self) -> Vec<String> {
        self.state.lock().await.participants.clone()
    }

    pub async fn last_event_fetch(&self) -> Option<ParticipantEvents> {
        self.state.lock().await.last_event_fetch.clone()
    }

    pub async fn last_update(&self) -> Signature {
        self.state.lock().await.last_update.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Core library for eventcache.
//!
//! Fetches participant names and per-participant event schedules from the
//! schedule API, keeps them in persistent key-value storage, and only
//! refetches when the server's last-update signature changes.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheManager, FileStorage, MemoryStorage, Storage};
pub use client::{CachedFetchClient, ClientBuilder, DeliveryMode};
pub use config::Config;
pub use models::{EventSlot, ParticipantEvents, Signature};

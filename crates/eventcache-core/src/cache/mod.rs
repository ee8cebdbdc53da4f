//! Local caching module for offline data access.
//!
//! `Storage` is the raw key-value layer (file-backed or in-memory) and
//! `CacheManager` gives typed access to the three persisted entities:
//! - the last-update signature (`lastUpdate`)
//! - the participant list (`participants`)
//! - the most recent participant event fetch (`lastEventFetch`)
//!
//! Freshness is decided by the server signature, not by age.

pub mod manager;
pub mod storage;

pub use manager::{CacheAges, CacheManager};
pub use storage::{FileStorage, MemoryStorage, Storage};

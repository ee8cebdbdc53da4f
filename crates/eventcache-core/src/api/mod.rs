//! REST API client module for the participant schedule service.
//!
//! This module provides the `ApiClient` for the three read-only JSON
//! endpoints: the participant list, a participant's events, and the
//! last-update signature used for cache invalidation.
//!
//! The API is public; no authentication is sent.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

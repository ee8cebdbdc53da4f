//! Data models for the participant schedule service.
//!
//! - `ParticipantsResponse` and `search`: the participant name list
//! - `ParticipantEvents`, `EventSlot`: one participant's schedule
//! - `Signature`: the opaque last-update token used for invalidation

pub mod event;
pub mod participant;
pub mod signature;

pub use event::{EventSlot, ParticipantEvents};
pub use participant::{search, ParticipantsResponse};
pub use signature::{Signature, NEVER};

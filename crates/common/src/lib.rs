//! Shared types for the inventory backend.

mod types;

pub use types::{ActorId, EntityId};

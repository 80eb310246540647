//! Domain layer types and invariants.

pub mod error;
pub mod excerpt;
pub mod posts;
pub mod slug;
pub mod tags;
pub mod types;

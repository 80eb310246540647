//! Repository contract and the services built on top of it.

pub mod error;
pub mod index;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod slugs;

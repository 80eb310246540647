//! Storage backends and runtime bootstrap.

pub mod error;
pub mod fs;
mod lock;
pub mod memory;
pub mod metrics;
mod table;
pub mod telemetry;

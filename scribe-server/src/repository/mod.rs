//! Repository Module
//!
//! Data access layer for the server. Jobs live in memory behind a
//! reader/writer lock and are written through to one JSON file per job.

pub mod job;

// Re-export for convenience
pub use job::{JobStore, StoreError};

//! Service Module
//!
//! Business logic layer for the server.
//! Services sit between the HTTP handlers and the job store and queue.

pub mod job;

// Re-export for convenience
pub use job as job_service;

//! Core domain types
//!
//! These types are shared between the server (which persists and mutates jobs)
//! and the client/CLI (which only read them).

pub mod job;
pub mod source;

//! Data Transfer Objects
//!
//! Request and response bodies exchanged between the Scribe server and its
//! clients. The job record itself is sent as-is (see `domain::job::Job`).

pub mod job;

//! Scribe Core
//!
//! Core types shared by the Scribe transcription services.
//!
//! This crate contains:
//! - Domain types: the job record, its lifecycle and progress, source validation
//! - DTOs: request and error bodies exchanged between server and clients

pub mod domain;
pub mod dto;

//! Transcription pipeline
//!
//! Drives one job from submission to a published transcript:
//! metadata probe, audio download, optional chunking, transcription, save.
//! A second entry point picks up jobs interrupted by a restart.

pub mod artifacts;
pub mod chunker;
pub mod executor;
pub mod resume;

pub use executor::{Pipeline, PipelineError};

//! Scheduler Module
//!
//! Decides when jobs run: a bounded queue feeding a single serial worker,
//! detached runs for overflow and resumed jobs, and startup recovery.

pub mod queue;
pub mod recovery;
pub mod worker;

pub use queue::{DetachedRuns, Dispatch, OverflowPolicy, WorkQueue};
pub use worker::QueueWorker;

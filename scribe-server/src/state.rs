//! Shared application state handed to every handler

use scribe_core::domain::source::SourceAllowlist;
use std::sync::Arc;

use crate::repository::JobStore;
use crate::scheduler::WorkQueue;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub queue: WorkQueue,
    pub allowlist: Arc<SourceAllowlist>,
}

impl AppState {
    pub fn new(store: Arc<JobStore>, queue: WorkQueue, allowlist: SourceAllowlist) -> Self {
        Self {
            store,
            queue,
            allowlist: Arc::new(allowlist),
        }
    }
}

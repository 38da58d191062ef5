//! Work queue
//!
//! Submissions go through a bounded channel drained by the serial worker.
//! When the channel is full the configured [`OverflowPolicy`] decides
//! whether the job runs immediately beside the worker, waits for room, or
//! is turned away.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use crate::pipeline::Pipeline;

/// Behaviour of [`WorkQueue::enqueue`] when the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Run the job at once on its own task
    Spill,
    /// Wait until the worker frees a slot
    Block,
    /// Fail the submission
    Reject,
}

impl FromStr for OverflowPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spill" => Ok(Self::Spill),
            "block" => Ok(Self::Block),
            "reject" => Ok(Self::Reject),
            other => anyhow::bail!(
                "unknown overflow policy '{}' (expected spill, block or reject)",
                other
            ),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spill => "spill",
            Self::Block => "block",
            Self::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// Outcome of handing a job to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Buffered for the serial worker
    Queued,
    /// Running on its own task outside the worker
    Spilled,
    /// Turned away because the queue is full
    Rejected,
}

/// Spawner for runs that bypass the serial worker
///
/// With a limit, at most that many detached runs execute at once and the
/// rest wait for a permit.
#[derive(Clone, Default)]
pub struct DetachedRuns {
    limit: Option<Arc<Semaphore>>,
}

impl DetachedRuns {
    pub fn new(max_concurrent: Option<usize>) -> Self {
        Self {
            limit: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn spawn<F>(&self, run: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let limit = self.limit.clone();

        tokio::spawn(async move {
            // Permit is released when dropped
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            run.await;
        })
    }
}

/// Producer side of the job queue
#[derive(Clone)]
pub struct WorkQueue {
    sender: mpsc::Sender<Uuid>,
    policy: OverflowPolicy,
    detached: DetachedRuns,
    pipeline: Pipeline,
}

impl WorkQueue {
    /// Creates the queue and the receiver the worker drains
    pub fn new(
        capacity: usize,
        policy: OverflowPolicy,
        detached: DetachedRuns,
        pipeline: Pipeline,
    ) -> (Self, mpsc::Receiver<Uuid>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let queue = Self {
            sender,
            policy,
            detached,
            pipeline,
        };

        (queue, receiver)
    }

    /// Hands a job to the worker, applying the overflow policy when full
    pub async fn enqueue(&self, id: Uuid) -> Dispatch {
        match self.sender.try_send(id) {
            Ok(()) => Dispatch::Queued,
            Err(TrySendError::Full(id)) => match self.policy {
                OverflowPolicy::Spill => {
                    warn!("Job queue full, processing job {} immediately", id);
                    self.spill(id);
                    Dispatch::Spilled
                }
                OverflowPolicy::Block => {
                    warn!("Job queue full, waiting for room for job {}", id);
                    match self.sender.send(id).await {
                        Ok(()) => Dispatch::Queued,
                        Err(e) => {
                            error!("Job queue closed, processing job {} detached", e.0);
                            self.spill(e.0);
                            Dispatch::Spilled
                        }
                    }
                }
                OverflowPolicy::Reject => {
                    warn!("Job queue full, rejecting job {}", id);
                    Dispatch::Rejected
                }
            },
            Err(TrySendError::Closed(id)) => {
                error!("Job queue closed, processing job {} detached", id);
                self.spill(id);
                Dispatch::Spilled
            }
        }
    }

    fn spill(&self, id: Uuid) {
        let pipeline = self.pipeline.clone();
        self.detached.spawn(async move { pipeline.run(id).await });
    }
}

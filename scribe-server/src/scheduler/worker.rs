//! Queue worker
//!
//! Drains the work queue one job at a time. A failing job is recorded on
//! its record by the pipeline and the worker moves on to the next one.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::pipeline::Pipeline;

/// Serial consumer of the work queue
pub struct QueueWorker {
    receiver: mpsc::Receiver<Uuid>,
    pipeline: Pipeline,
}

impl QueueWorker {
    pub fn new(receiver: mpsc::Receiver<Uuid>, pipeline: Pipeline) -> Self {
        Self { receiver, pipeline }
    }

    /// Starts the worker on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Processes queued jobs until every sender is dropped
    pub async fn run(mut self) {
        info!("Background worker started");

        while let Some(id) = self.receiver.recv().await {
            match self.pipeline.store().get(id) {
                None => {
                    warn!("Queued job {} no longer exists, skipping", id);
                    continue;
                }
                Some(job) if job.status.is_terminal() => {
                    warn!("Queued job {} already finished ({}), skipping", id, job.status);
                    continue;
                }
                Some(_) => {}
            }

            info!("Processing job {} from queue", id);
            self.pipeline.run(id).await;
            info!("Finished processing job {}", id);
        }

        info!("Background worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{DetachedRuns, OverflowPolicy, WorkQueue};
    use crate::testing::{FakeTooling, Fixture, wait_for_terminal};
    use scribe_core::domain::job::JobStatus;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_worker_runs_jobs_one_at_a_time() {
        let tooling = FakeTooling::new().with_transcribe_delay(Duration::from_millis(20));
        let fixture = Fixture::new(tooling);
        let (queue, receiver) = WorkQueue::new(
            10,
            OverflowPolicy::Spill,
            DetachedRuns::default(),
            fixture.pipeline.clone(),
        );
        let handle = QueueWorker::new(receiver, fixture.pipeline.clone()).spawn();

        let ids: Vec<_> = (0..3)
            .map(|_| fixture.submit("https://youtu.be/xyz"))
            .collect();
        for id in &ids {
            queue.enqueue(*id).await;
        }

        for id in &ids {
            let job = wait_for_terminal(&fixture.store, *id).await;
            assert_eq!(job.status, JobStatus::Done);
        }
        assert_eq!(fixture.tooling.max_in_flight.load(Ordering::SeqCst), 1);

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_survives_failing_job() {
        let fixture = Fixture::new(FakeTooling::new().panicking());
        let (queue, receiver) = WorkQueue::new(
            10,
            OverflowPolicy::Spill,
            DetachedRuns::default(),
            fixture.pipeline.clone(),
        );
        let handle = QueueWorker::new(receiver, fixture.pipeline.clone()).spawn();

        let first = fixture.submit("https://youtu.be/one");
        let second = fixture.submit("https://youtu.be/two");
        queue.enqueue(first).await;
        queue.enqueue(second).await;

        assert_eq!(wait_for_terminal(&fixture.store, first).await.status, JobStatus::Error);
        assert_eq!(wait_for_terminal(&fixture.store, second).await.status, JobStatus::Error);

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_skips_unknown_and_finished_jobs() {
        let fixture = Fixture::new(FakeTooling::new());
        let (queue, receiver) = WorkQueue::new(
            10,
            OverflowPolicy::Spill,
            DetachedRuns::default(),
            fixture.pipeline.clone(),
        );

        let finished = fixture.submit("https://youtu.be/done");
        fixture
            .store
            .update(finished, |job| job.mark_failed("Rejected: work queue is full"))
            .unwrap();

        queue.enqueue(Uuid::new_v4()).await;
        queue.enqueue(finished).await;
        drop(queue);

        QueueWorker::new(receiver, fixture.pipeline.clone()).run().await;

        assert_eq!(fixture.tooling.fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.store.get(finished).unwrap().status, JobStatus::Error);
    }
}

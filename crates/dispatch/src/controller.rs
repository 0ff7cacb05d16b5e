//! Job controller: admission, cancellation, and status for dispatch jobs.
//!
//! Holds at most one job at a time. A new submission is admitted only when
//! the held job is terminal, and then replaces it. The job runs as a
//! background task on the controller's [`TaskTracker`] so shutdown can wait
//! for it to wind down.

use std::sync::Arc;

use herald_core::error::CoreError;
use herald_core::job::{DispatchJob, JobRequest, JobStatus, JOB_ALREADY_ACTIVE};
use herald_core::types::JobId;
use herald_events::EventBus;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::handle::JobHandle;
use crate::runner::run_job;
use crate::sender::MessageSender;

/// Serializes dispatch for one sending identity.
pub struct JobController {
    sender: Arc<dyn MessageSender>,
    bus: Arc<EventBus>,
    slot: RwLock<Option<Arc<JobHandle>>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl JobController {
    pub fn new(sender: Arc<dyn MessageSender>, bus: Arc<EventBus>) -> Self {
        Self {
            sender,
            bus,
            slot: RwLock::new(None),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Admit a job and start its dispatch loop.
    ///
    /// Fails with `Conflict` while another job is pending or running, or
    /// once the controller is shutting down. The request itself was already
    /// validated when the [`JobRequest`] was built.
    pub async fn submit(&self, request: JobRequest) -> Result<DispatchJob, CoreError> {
        if self.shutdown.is_cancelled() {
            return Err(CoreError::Conflict(
                "dispatcher is shutting down".to_string(),
            ));
        }

        let mut slot = self.slot.write().await;
        if let Some(active) = slot.as_ref() {
            if !active.status().is_terminal() {
                tracing::warn!(active_job_id = %active.id(), "Rejected submission, job already active");
                return Err(CoreError::Conflict(JOB_ALREADY_ACTIVE.to_string()));
            }
        }

        let handle = Arc::new(JobHandle::new(request, self.shutdown.child_token()));
        handle.mark_running();
        *slot = Some(Arc::clone(&handle));
        drop(slot);

        tracing::info!(
            job_id = %handle.id(),
            total = handle.total(),
            min_delay = handle.delay().min_secs(),
            max_delay = handle.delay().max_secs(),
            "Dispatch job admitted",
        );

        let snapshot = handle.snapshot();
        self.tracker.spawn(run_job(
            handle,
            Arc::clone(&self.sender),
            Arc::clone(&self.bus),
        ));

        Ok(snapshot)
    }

    /// Request cooperative cancellation.
    ///
    /// Returns the status observed at the time of the request; the job
    /// reaches `cancelled` once the in-flight send (if any) returns.
    /// Cancelling a finished job is acknowledged and changes nothing.
    pub async fn cancel(&self, job_id: JobId) -> Result<JobStatus, CoreError> {
        let handle = self.find(job_id).await?;
        let status = handle.status();
        if status.is_terminal() {
            tracing::debug!(%job_id, %status, "Cancel requested for finished job");
        } else {
            handle.request_cancel();
            tracing::info!(%job_id, "Cancel requested");
        }
        Ok(status)
    }

    /// Snapshot of a job by id.
    pub async fn status(&self, job_id: JobId) -> Result<DispatchJob, CoreError> {
        Ok(self.find(job_id).await?.snapshot())
    }

    /// Snapshot of the held job, running or most recently finished.
    pub async fn current(&self) -> Option<DispatchJob> {
        self.slot.read().await.as_ref().map(|h| h.snapshot())
    }

    /// Whether a job is pending or running.
    pub async fn is_busy(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .is_some_and(|h| !h.status().is_terminal())
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Cancel the running job (if any), refuse new submissions, and wait for
    /// the dispatch loop to publish its completion.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Job controller shut down");
    }

    async fn find(&self, job_id: JobId) -> Result<Arc<JobHandle>, CoreError> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|h| h.id() == job_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Job",
                id: job_id.to_string(),
            })
    }
}

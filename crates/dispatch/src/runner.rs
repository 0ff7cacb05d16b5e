//! The per-job dispatch loop.

use std::sync::Arc;

use chrono::Utc;
use herald_core::delay::next_delay;
use herald_core::job::JobStatus;
use herald_core::outcome::Disposition;
use herald_core::progress::{CompletionSummary, DispatchAttempt, FailedRecipient, ProgressEvent};
use herald_events::{DispatchEvent, EventBus};

use crate::handle::JobHandle;
use crate::sender::MessageSender;

/// How the loop stopped.
struct Termination {
    status: JobStatus,
    reason: Option<String>,
}

impl Termination {
    fn with(status: JobStatus) -> Self {
        Self {
            status,
            reason: None,
        }
    }
}

/// Run `handle` to a terminal status, then publish its completion summary.
pub(crate) async fn run_job(
    handle: Arc<JobHandle>,
    sender: Arc<dyn MessageSender>,
    bus: Arc<EventBus>,
) {
    let job_id = handle.id();
    tracing::info!(%job_id, total = handle.total(), "Dispatch started");
    bus.publish(DispatchEvent::started(job_id, handle.total()));

    let mut failures = Vec::new();
    let termination = drive(&handle, sender.as_ref(), &bus, &mut failures).await;

    let tally = handle.tally();
    let summary = CompletionSummary {
        job_id,
        job_status: termination.status,
        total: handle.total(),
        processed: tally.processed(),
        successful: tally.successful,
        failed: tally.failed,
        reason: termination.reason,
        failures,
        finished_at: Utc::now(),
    };

    if !handle.finish(summary.clone()) {
        tracing::error!(%job_id, "Dispatch job finished twice");
        return;
    }

    tracing::info!(
        %job_id,
        status = %summary.job_status,
        processed = summary.processed,
        successful = summary.successful,
        failed = summary.failed,
        "Dispatch finished",
    );
    bus.publish(DispatchEvent::Complete(summary));
}

/// Attempt every recipient in order until the list runs out, the job is
/// cancelled, or the session is lost.
async fn drive(
    handle: &JobHandle,
    sender: &dyn MessageSender,
    bus: &EventBus,
    failures: &mut Vec<FailedRecipient>,
) -> Termination {
    let job_id = handle.id();
    let total = handle.total();
    let cancel = handle.cancel_token();

    for (index, recipient) in handle.recipients().iter().enumerate() {
        let position = index + 1;

        if cancel.is_cancelled() {
            tracing::info!(%job_id, position, "Dispatch cancelled between attempts");
            return Termination::with(JobStatus::Cancelled);
        }

        let delay = next_delay(&handle.delay());
        tracing::debug!(
            %job_id,
            position,
            delay_ms = delay.as_millis() as u64,
            "Waiting before next attempt",
        );
        bus.publish(DispatchEvent::waiting(job_id, position, total, recipient, delay));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(%job_id, position, "Dispatch cancelled during delay");
                return Termination::with(JobStatus::Cancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        // The send itself is never interrupted.
        let outcome = sender.send(recipient, handle.message()).await;

        let (kind, reason) = match outcome.classify() {
            Disposition::Fatal { reason } => {
                tracing::warn!(
                    %job_id,
                    position,
                    %recipient,
                    %reason,
                    "Session lost, aborting remaining queue",
                );
                return Termination {
                    status: JobStatus::Aborted,
                    reason: Some(reason),
                };
            }
            Disposition::Counted { kind, reason } => (kind, reason),
        };

        let tally = handle.record(kind);
        if kind.is_success() {
            tracing::info!(%job_id, position, %recipient, "Message delivered");
        } else {
            tracing::warn!(
                %job_id,
                position,
                %recipient,
                outcome = ?kind,
                reason = reason.as_deref().unwrap_or_default(),
                "Message not delivered",
            );
            failures.push(FailedRecipient {
                recipient: recipient.clone(),
                outcome: kind,
                reason: reason.clone(),
            });
        }

        bus.publish(DispatchEvent::Progress(ProgressEvent::after_attempt(
            job_id,
            DispatchAttempt {
                recipient: recipient.clone(),
                kind,
                reason,
                position,
            },
            total,
            tally.successful,
            tally.failed,
        )));
    }

    Termination::with(JobStatus::Completed)
}

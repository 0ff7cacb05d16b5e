//! Dispatch events to WebSocket observers.
//!
//! [`ProgressForwarder`] subscribes to the [`EventBus`](herald_events::EventBus)
//! and broadcasts every [`DispatchEvent`] as a JSON text frame. A slow
//! forwarder lags and skips events; it never slows the dispatch loop.

use std::sync::Arc;

use herald_core::job::DispatchJob;
use herald_core::messages::MSG_TYPE_DM_STATUS;
use herald_events::DispatchEvent;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Forwards dispatch events to every connected observer.
pub struct ProgressForwarder {
    ws_manager: Arc<WsManager>,
}

impl ProgressForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until `cancel` fires or the bus is closed.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<DispatchEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Progress forwarder stopping");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    let delivered = self.ws_manager.broadcast_json(&event_message(&event)).await;
                    tracing::trace!(
                        job_id = %event.job_id(),
                        message_type = event.message_type(),
                        delivered,
                        "Forwarded dispatch event",
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Progress forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, progress forwarder shutting down");
                    break;
                }
            }
        }
    }
}

/// Wire form of a dispatch event.
pub fn event_message(event: &DispatchEvent) -> Value {
    let message_type = event.message_type();
    match event {
        DispatchEvent::Started {
            job_id,
            total,
            timestamp,
        } => json!({
            "type": message_type,
            "job_id": job_id,
            "total": total,
            "timestamp": timestamp,
        }),

        DispatchEvent::Waiting {
            job_id,
            position,
            total,
            recipient,
            delay_secs,
            timestamp,
        } => json!({
            "type": message_type,
            "job_id": job_id,
            "position": position,
            "total": total,
            "recipient": recipient,
            "delay": delay_secs,
            "timestamp": timestamp,
        }),

        DispatchEvent::Progress(progress) => json!({
            "type": message_type,
            "job_id": progress.job_id,
            "current": progress.current,
            "total": progress.total,
            "successful": progress.successful,
            "failed": progress.failed,
            "status": progress.status,
            "outcome": progress.outcome,
            "recipient": progress.recipient,
            "reason": progress.reason,
            "timestamp": progress.timestamp,
        }),

        DispatchEvent::Complete(summary) => json!({
            "type": message_type,
            "job_id": summary.job_id,
            "status": summary.job_status,
            "reason": summary.reason,
            "summary": {
                "successful": summary.successful,
                "failed": summary.failed,
                "total": summary.total,
                "processed": summary.processed,
            },
            "failures": summary.failures,
            "timestamp": summary.finished_at,
        }),
    }
}

/// `dm_status` snapshot sent to an observer when it connects.
pub fn status_message(job: Option<&DispatchJob>) -> Value {
    json!({
        "type": MSG_TYPE_DM_STATUS,
        "job": job,
    })
}

#[cfg(test)]
mod tests {
    use herald_core::job::JobStatus;
    use herald_core::outcome::{AttemptStatus, OutcomeKind};
    use herald_core::progress::{CompletionSummary, ProgressEvent};
    use herald_core::types::JobId;

    use super::*;

    #[test]
    fn progress_message_carries_counters() {
        let event = DispatchEvent::Progress(ProgressEvent {
            job_id: JobId::nil(),
            current: 2,
            total: 5,
            successful: 1,
            failed: 1,
            status: AttemptStatus::Failed,
            outcome: OutcomeKind::RateLimited,
            recipient: "bob".into(),
            reason: Some("slow down".into()),
            timestamp: chrono::Utc::now(),
        });

        let msg = event_message(&event);
        assert_eq!(msg["type"], "dm_progress_update");
        assert_eq!(msg["current"], 2);
        assert_eq!(msg["total"], 5);
        assert_eq!(msg["status"], "failed");
        assert_eq!(msg["outcome"], "rate_limited");
        assert_eq!(msg["reason"], "slow down");
    }

    #[test]
    fn complete_message_nests_summary() {
        let event = DispatchEvent::Complete(CompletionSummary {
            job_id: JobId::nil(),
            job_status: JobStatus::Aborted,
            total: 3,
            processed: 1,
            successful: 1,
            failed: 0,
            reason: Some("logged out".into()),
            failures: Vec::new(),
            finished_at: chrono::Utc::now(),
        });

        let msg = event_message(&event);
        assert_eq!(msg["type"], "dm_complete");
        assert_eq!(msg["status"], "aborted");
        assert_eq!(msg["reason"], "logged out");
        assert_eq!(msg["summary"]["successful"], 1);
        assert_eq!(msg["summary"]["total"], 3);
    }

    #[test]
    fn waiting_message_reports_delay_in_seconds() {
        let event = DispatchEvent::waiting(
            JobId::nil(),
            1,
            2,
            "alice",
            std::time::Duration::from_millis(2500),
        );

        let msg = event_message(&event);
        assert_eq!(msg["type"], "dm_waiting");
        assert_eq!(msg["delay"], 2.5);
        assert_eq!(msg["position"], 1);
    }

    #[test]
    fn status_message_without_job_is_null() {
        let msg = status_message(None);
        assert_eq!(msg["type"], "dm_status");
        assert!(msg["job"].is_null());
    }
}

//! Progress and completion payloads emitted by the dispatch loop.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::job::JobStatus;
use crate::outcome::{AttemptStatus, OutcomeKind};
use crate::types::{JobId, Timestamp};

/// One counted send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAttempt {
    pub recipient: String,
    pub kind: OutcomeKind,
    pub reason: Option<String>,
    /// 1-based position in the job's recipient sequence.
    pub position: usize,
}

/// Emitted once per counted attempt, in attempt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    /// Attempts completed so far, including this one.
    pub current: usize,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub status: AttemptStatus,
    pub outcome: OutcomeKind,
    pub recipient: String,
    pub reason: Option<String>,
    pub timestamp: Timestamp,
}

impl ProgressEvent {
    /// Build the event for `attempt` given the running totals after it.
    pub fn after_attempt(
        job_id: JobId,
        attempt: DispatchAttempt,
        total: usize,
        successful: usize,
        failed: usize,
    ) -> Self {
        Self {
            job_id,
            current: attempt.position,
            total,
            successful,
            failed,
            status: attempt.kind.status(),
            outcome: attempt.kind,
            recipient: attempt.recipient,
            reason: attempt.reason,
            timestamp: Utc::now(),
        }
    }
}

/// A recipient whose attempt was counted as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecipient {
    pub recipient: String,
    pub outcome: OutcomeKind,
    pub reason: Option<String>,
}

/// Final word on a job; always the last event published for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub job_id: JobId,
    pub job_status: JobStatus,
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Abort reason for `aborted` jobs.
    pub reason: Option<String>,
    pub failures: Vec<FailedRecipient>,
    pub finished_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_carries_attempt_position_as_current() {
        let job_id = JobId::new_v4();
        let event = ProgressEvent::after_attempt(
            job_id,
            DispatchAttempt {
                recipient: "alice".into(),
                kind: OutcomeKind::RateLimited,
                reason: Some("429".into()),
                position: 2,
            },
            5,
            1,
            1,
        );

        assert_eq!(event.current, 2);
        assert_eq!(event.total, 5);
        assert_eq!(event.status, AttemptStatus::Failed);
        assert_eq!(event.outcome, OutcomeKind::RateLimited);
        assert_eq!(event.recipient, "alice");
    }

    #[test]
    fn progress_event_serializes_coarse_and_detailed_status() {
        let event = ProgressEvent::after_attempt(
            JobId::new_v4(),
            DispatchAttempt {
                recipient: "bob".into(),
                kind: OutcomeKind::Delivered,
                reason: None,
                position: 1,
            },
            1,
            1,
            0,
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["outcome"], "delivered");
        assert_eq!(json["current"], 1);
        assert!(json["timestamp"].is_string());
    }
}

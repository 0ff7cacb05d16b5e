//! Events published by the dispatch loop.

use chrono::Utc;
use herald_core::messages::{
    MSG_TYPE_DM_COMPLETE, MSG_TYPE_DM_PROGRESS, MSG_TYPE_DM_STARTED, MSG_TYPE_DM_WAITING,
};
use herald_core::progress::{CompletionSummary, ProgressEvent};
use herald_core::types::{JobId, Timestamp};
use serde::Serialize;

/// Everything observers hear about a job, in publication order.
///
/// For a given job the sequence is `Started`, then for each attempt a
/// `Waiting` followed by a `Progress`, and finally exactly one `Complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DispatchEvent {
    Started {
        job_id: JobId,
        total: usize,
        timestamp: Timestamp,
    },
    Waiting {
        job_id: JobId,
        /// 1-based position of the recipient about to be attempted.
        position: usize,
        total: usize,
        recipient: String,
        delay_secs: f64,
        timestamp: Timestamp,
    },
    Progress(ProgressEvent),
    Complete(CompletionSummary),
}

impl DispatchEvent {
    pub fn started(job_id: JobId, total: usize) -> Self {
        DispatchEvent::Started {
            job_id,
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn waiting(
        job_id: JobId,
        position: usize,
        total: usize,
        recipient: impl Into<String>,
        delay: std::time::Duration,
    ) -> Self {
        DispatchEvent::Waiting {
            job_id,
            position,
            total,
            recipient: recipient.into(),
            delay_secs: delay.as_secs_f64(),
            timestamp: Utc::now(),
        }
    }

    pub fn job_id(&self) -> JobId {
        match self {
            DispatchEvent::Started { job_id, .. } | DispatchEvent::Waiting { job_id, .. } => {
                *job_id
            }
            DispatchEvent::Progress(event) => event.job_id,
            DispatchEvent::Complete(summary) => summary.job_id,
        }
    }

    /// Wire message type for this event.
    pub fn message_type(&self) -> &'static str {
        match self {
            DispatchEvent::Started { .. } => MSG_TYPE_DM_STARTED,
            DispatchEvent::Waiting { .. } => MSG_TYPE_DM_WAITING,
            DispatchEvent::Progress(_) => MSG_TYPE_DM_PROGRESS,
            DispatchEvent::Complete(_) => MSG_TYPE_DM_COMPLETE,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchEvent::Complete(_))
    }
}

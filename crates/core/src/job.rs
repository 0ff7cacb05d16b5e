//! Dispatch job model: status state machine, admission validation, and the
//! read-only snapshot returned to observers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::delay::DelayBounds;
use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Longest message body accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Recipient cap applied when the caller does not supply a smaller one.
pub const DEFAULT_MAX_RECIPIENTS: usize = 1000;

/// Hard ceiling on recipients per job. Job counters are 32-bit each.
pub const MAX_RECIPIENTS_LIMIT: usize = u32::MAX as usize;

/// Rejection reason when a job is already running for this identity.
pub const JOB_ALREADY_ACTIVE: &str = "job already active";

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a dispatch job.
///
/// `Pending -> Running -> {Completed | Cancelled | Aborted}`; the three
/// right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Aborted,
}

impl JobStatus {
    /// Compact id, used to store the status in an atomic.
    pub fn id(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Completed => 2,
            JobStatus::Cancelled => 3,
            JobStatus::Aborted => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(JobStatus::Pending),
            1 => Some(JobStatus::Running),
            2 => Some(JobStatus::Completed),
            3 => Some(JobStatus::Cancelled),
            4 => Some(JobStatus::Aborted),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Aborted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobRequest
// ---------------------------------------------------------------------------

/// A validated submission, ready to be admitted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    recipients: Vec<String>,
    message: String,
    delay: DelayBounds,
}

impl JobRequest {
    /// Validate a submission.
    ///
    /// Recipients are normalized with [`normalize_recipients`] and then
    /// truncated to the first `max_recipients` (never more than
    /// [`MAX_RECIPIENTS_LIMIT`]), preserving the caller's order. The message
    /// is kept verbatim.
    pub fn new(
        recipients: Vec<String>,
        message: String,
        delay: DelayBounds,
        max_recipients: usize,
    ) -> Result<Self, CoreError> {
        if message.trim().is_empty() {
            return Err(CoreError::Validation("Message cannot be empty".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::Validation(format!(
                "Message must not exceed {MAX_MESSAGE_CHARS} characters"
            )));
        }
        if max_recipients == 0 {
            return Err(CoreError::Validation(
                "max_dms must be at least 1".to_string(),
            ));
        }

        let mut recipients = normalize_recipients(recipients);
        recipients.truncate(max_recipients.min(MAX_RECIPIENTS_LIMIT));
        if recipients.is_empty() {
            return Err(CoreError::Validation("No usernames provided".to_string()));
        }

        Ok(Self {
            recipients,
            message,
            delay,
        })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn delay(&self) -> DelayBounds {
        self.delay
    }

    pub fn into_parts(self) -> (Vec<String>, String, DelayBounds) {
        (self.recipients, self.message, self.delay)
    }
}

/// Trim whitespace and a leading `@`, drop blanks, and drop repeats.
///
/// The first occurrence of each username wins, so the operator's ordering
/// is otherwise untouched.
pub fn normalize_recipients<I>(usernames: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    usernames
        .into_iter()
        .filter_map(|raw| {
            let name = raw.trim().trim_start_matches('@').trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// DispatchJob snapshot
// ---------------------------------------------------------------------------

/// Point-in-time, read-only view of a job.
///
/// Counters always satisfy `successful + failed == processed <= total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchJob {
    pub id: JobId,
    pub status: JobStatus,
    pub recipients: Vec<String>,
    pub message: String,
    pub min_delay: f64,
    pub max_delay: f64,
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub abort_reason: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shared, lock-free view of one job.
//!
//! The dispatch loop is the only writer. Status reads and cancellation come
//! from other tasks and never wait on the loop, even while it sleeps or is
//! inside a slow send.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use herald_core::delay::DelayBounds;
use herald_core::job::{DispatchJob, JobRequest, JobStatus};
use herald_core::outcome::OutcomeKind;
use herald_core::progress::CompletionSummary;
use herald_core::types::{JobId, Timestamp};
use tokio_util::sync::CancellationToken;

/// Successful count lives in the high 32 bits, failed in the low 32 bits.
/// Jobs never exceed `MAX_RECIPIENTS_LIMIT` recipients, so neither half
/// can carry into the other.
const SUCCESS_UNIT: u64 = 1 << 32;
const FAILED_MASK: u64 = 0xFFFF_FFFF;

/// Counter values read in one atomic load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub successful: usize,
    pub failed: usize,
}

impl Tally {
    fn decode(raw: u64) -> Self {
        Self {
            successful: (raw >> 32) as usize,
            failed: (raw & FAILED_MASK) as usize,
        }
    }

    pub fn processed(&self) -> usize {
        self.successful + self.failed
    }
}

/// One admitted job: immutable inputs plus atomically updated progress.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    recipients: Vec<String>,
    message: String,
    delay: DelayBounds,
    created_at: Timestamp,
    status: AtomicU8,
    tally: AtomicU64,
    cancel: CancellationToken,
    started_at: OnceLock<Timestamp>,
    summary: OnceLock<CompletionSummary>,
}

impl JobHandle {
    /// Create a `pending` handle. `cancel` is usually a child of the
    /// controller's shutdown token.
    pub fn new(request: JobRequest, cancel: CancellationToken) -> Self {
        let (recipients, message, delay) = request.into_parts();
        Self {
            id: JobId::new_v4(),
            recipients,
            message,
            delay,
            created_at: Utc::now(),
            status: AtomicU8::new(JobStatus::Pending.id()),
            tally: AtomicU64::new(0),
            cancel,
            started_at: OnceLock::new(),
            summary: OnceLock::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn total(&self) -> usize {
        self.recipients.len()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn delay(&self) -> DelayBounds {
        self.delay
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::from_id(self.status.load(Ordering::Acquire)).unwrap_or(JobStatus::Aborted)
    }

    pub fn tally(&self) -> Tally {
        Tally::decode(self.tally.load(Ordering::Acquire))
    }

    pub fn summary(&self) -> Option<&CompletionSummary> {
        self.summary.get()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Flag the job for cooperative cancellation.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// `pending -> running`, stamping the start time.
    pub(crate) fn mark_running(&self) {
        let _ = self.started_at.set(Utc::now());
        self.status.store(JobStatus::Running.id(), Ordering::Release);
    }

    /// Count one attempt and return the totals including it.
    pub(crate) fn record(&self, kind: OutcomeKind) -> Tally {
        let unit = if kind.is_success() { SUCCESS_UNIT } else { 1 };
        let previous = self.tally.fetch_add(unit, Ordering::AcqRel);
        Tally::decode(previous + unit)
    }

    /// Store the summary and publish its terminal status.
    ///
    /// Returns `false` if the job had already finished.
    pub(crate) fn finish(&self, summary: CompletionSummary) -> bool {
        let status = summary.job_status;
        if self.summary.set(summary).is_err() {
            return false;
        }
        self.status.store(status.id(), Ordering::Release);
        true
    }

    /// Point-in-time snapshot. Counters are read in a single load, so
    /// `successful + failed == processed` always holds.
    pub fn snapshot(&self) -> DispatchJob {
        let status = self.status();
        let tally = self.tally();
        let summary = self.summary.get();

        DispatchJob {
            id: self.id,
            status,
            recipients: self.recipients.clone(),
            message: self.message.clone(),
            min_delay: self.delay.min_secs(),
            max_delay: self.delay.max_secs(),
            total: self.total(),
            processed: tally.processed(),
            successful: tally.successful,
            failed: tally.failed,
            abort_reason: summary.and_then(|s| s.reason.clone()),
            created_at: self.created_at,
            started_at: self.started_at.get().copied(),
            finished_at: summary.map(|s| s.finished_at),
        }
    }
}

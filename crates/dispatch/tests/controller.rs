//! Integration tests for `JobController`.
//!
//! A scripted in-memory sender stands in for the platform. Tests run on a
//! paused tokio clock so jittered delays elapse instantly and the exact
//! wait before each attempt can be measured.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use herald_core::delay::DelayBounds;
use herald_core::error::CoreError;
use herald_core::job::{JobRequest, JobStatus};
use herald_core::outcome::{AttemptStatus, OutcomeKind, SendOutcome};
use herald_core::progress::{CompletionSummary, ProgressEvent};
use herald_core::types::JobId;
use herald_dispatch::{JobController, MessageSender};
use herald_events::{DispatchEvent, EventBus};
use tokio::sync::{broadcast, Notify};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sender that answers from a script and records when each attempt happened.
///
/// Recipients missing from the script are delivered. A recipient listed in
/// `hold` blocks inside `send` until `release` is notified, after signalling
/// `entered`.
#[derive(Default)]
struct ScriptedSender {
    script: HashMap<String, SendOutcome>,
    attempts: Mutex<Vec<(String, Instant)>>,
    hold: Option<String>,
    entered: Notify,
    release: Notify,
}

impl ScriptedSender {
    fn delivering() -> Self {
        Self::default()
    }

    fn with(mut self, recipient: &str, outcome: SendOutcome) -> Self {
        self.script.insert(recipient.to_string(), outcome);
        self
    }

    fn holding(mut self, recipient: &str) -> Self {
        self.hold = Some(recipient.to_string());
        self
    }

    fn attempted(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl MessageSender for ScriptedSender {
    async fn send(&self, recipient: &str, _message: &str) -> SendOutcome {
        self.attempts
            .lock()
            .unwrap()
            .push((recipient.to_string(), Instant::now()));

        if self.hold.as_deref() == Some(recipient) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        self.script
            .get(recipient)
            .cloned()
            .unwrap_or(SendOutcome::Delivered)
    }
}

fn setup(
    sender: ScriptedSender,
) -> (
    Arc<ScriptedSender>,
    JobController,
    broadcast::Receiver<DispatchEvent>,
) {
    let sender = Arc::new(sender);
    let bus = Arc::new(EventBus::default());
    let rx = bus.subscribe();
    let controller = JobController::new(Arc::clone(&sender) as Arc<dyn MessageSender>, bus);
    (sender, controller, rx)
}

fn request(recipients: &[&str], min: f64, max: f64) -> JobRequest {
    JobRequest::new(
        recipients.iter().map(|s| s.to_string()).collect(),
        "hello there".to_string(),
        DelayBounds::new(min, max).unwrap(),
        1000,
    )
    .unwrap()
}

/// Drain events until the completion summary arrives.
async fn collect_until_complete(
    rx: &mut broadcast::Receiver<DispatchEvent>,
) -> (Vec<ProgressEvent>, CompletionSummary) {
    let mut progress = Vec::new();
    loop {
        match rx.recv().await.expect("bus closed before completion") {
            DispatchEvent::Progress(event) => progress.push(event),
            DispatchEvent::Complete(summary) => return (progress, summary),
            _ => {}
        }
    }
}

/// Wait for the progress event with `current == n`.
async fn wait_for_progress(rx: &mut broadcast::Receiver<DispatchEvent>, n: usize) {
    loop {
        if let DispatchEvent::Progress(event) = rx.recv().await.unwrap() {
            if event.current == n {
                return;
            }
        }
    }
}

fn assert_counters_consistent(events: &[ProgressEvent]) {
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.current, i + 1, "events out of order");
        assert_eq!(event.successful + event.failed, event.current);
        assert!(event.current <= event.total);
    }
}

// ---------------------------------------------------------------------------
// Test: all delivered produces ordered events and a full summary
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn all_delivered_emits_one_event_per_attempt() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let job = controller.submit(request(&["a", "b", "c"], 1.0, 1.0)).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.total, 3);

    let (events, summary) = collect_until_complete(&mut rx).await;

    assert_eq!(events.iter().map(|e| e.current).collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(
        events.iter().map(|e| e.recipient.as_str()).collect::<Vec<_>>(),
        ["a", "b", "c"]
    );
    assert_counters_consistent(&events);
    let last = events.last().unwrap();
    assert_eq!((last.successful, last.failed), (3, 0));

    assert_eq!(summary.job_status, JobStatus::Completed);
    assert_eq!((summary.total, summary.successful, summary.failed), (3, 3, 0));
    assert!(summary.failures.is_empty());

    let status = controller.status(job.id).await.unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.processed, 3);
}

// ---------------------------------------------------------------------------
// Test: a rate-limited recipient is counted as failed and the job continues
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn rate_limited_recipient_counts_as_failed() {
    let sender = ScriptedSender::delivering().with(
        "a",
        SendOutcome::RateLimited {
            reason: "too many requests".into(),
        },
    );
    let (_sender, controller, mut rx) = setup(sender);

    controller.submit(request(&["a", "b"], 0.0, 0.0)).await.unwrap();
    let (events, summary) = collect_until_complete(&mut rx).await;

    assert_eq!(events.len(), 2);
    assert_eq!((events[0].current, events[0].successful, events[0].failed), (1, 0, 1));
    assert_eq!(events[0].status, AttemptStatus::Failed);
    assert_eq!(events[0].outcome, OutcomeKind::RateLimited);
    assert_eq!(events[0].reason.as_deref(), Some("too many requests"));
    assert_eq!((events[1].current, events[1].successful, events[1].failed), (2, 1, 1));

    assert_eq!(summary.job_status, JobStatus::Completed);
    assert_eq!((summary.total, summary.successful, summary.failed), (2, 1, 1));
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].recipient, "a");
}

// ---------------------------------------------------------------------------
// Test: every per-recipient failure kind is tolerated
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn per_recipient_failures_never_halt_the_job() {
    let sender = ScriptedSender::delivering()
        .with("gone", SendOutcome::RecipientUnreachable { reason: "not found".into() })
        .with("flaky", SendOutcome::TransportError { reason: "reset".into() })
        .with("busy", SendOutcome::RateLimited { reason: "429".into() });
    let (sender, controller, mut rx) = setup(sender);

    controller
        .submit(request(&["gone", "flaky", "busy", "ok"], 0.0, 0.0))
        .await
        .unwrap();
    let (events, summary) = collect_until_complete(&mut rx).await;

    assert_counters_consistent(&events);
    assert_eq!(sender.attempted(), ["gone", "flaky", "busy", "ok"]);
    assert_eq!(summary.job_status, JobStatus::Completed);
    assert_eq!((summary.successful, summary.failed), (1, 3));
}

// ---------------------------------------------------------------------------
// Test: session loss aborts the remaining queue
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn session_loss_aborts_remaining_recipients() {
    let sender = ScriptedSender::delivering().with(
        "b",
        SendOutcome::SessionLost {
            reason: "logged out".into(),
        },
    );
    let (sender, controller, mut rx) = setup(sender);

    let job = controller.submit(request(&["a", "b", "c"], 0.0, 0.0)).await.unwrap();
    let (events, summary) = collect_until_complete(&mut rx).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipient, "a");
    assert_eq!(sender.attempted(), ["a", "b"]);

    assert_eq!(summary.job_status, JobStatus::Aborted);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.reason.as_deref(), Some("logged out"));

    let status = controller.status(job.id).await.unwrap();
    assert_eq!(status.status, JobStatus::Aborted);
    assert_eq!(status.processed, 1);
    assert_eq!(status.abort_reason.as_deref(), Some("logged out"));
}

// ---------------------------------------------------------------------------
// Test: cancel during the delay before the second recipient
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_during_delay_stops_before_next_attempt() {
    let (sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let job = controller.submit(request(&["a", "b", "c"], 10.0, 10.0)).await.unwrap();
    wait_for_progress(&mut rx, 1).await;

    let started = Instant::now();
    assert_eq!(controller.cancel(job.id).await.unwrap(), JobStatus::Running);
    let (events, summary) = collect_until_complete(&mut rx).await;

    assert!(events.is_empty());
    assert!(started.elapsed() < Duration::from_secs(10), "delay was not shortened");
    assert_eq!(sender.attempted(), ["a"]);
    assert_eq!(summary.job_status, JobStatus::Cancelled);
    assert_eq!(summary.processed, 1);

    let status = controller.status(job.id).await.unwrap();
    assert_eq!(status.status, JobStatus::Cancelled);
    assert!(status.processed < status.total);
}

// ---------------------------------------------------------------------------
// Test: cancel never interrupts an in-flight send
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_waits_for_in_flight_send() {
    let (sender, controller, mut rx) = setup(ScriptedSender::delivering().holding("a"));

    let job = controller.submit(request(&["a", "b"], 0.0, 0.0)).await.unwrap();
    sender.entered.notified().await;

    controller.cancel(job.id).await.unwrap();
    assert_eq!(controller.status(job.id).await.unwrap().status, JobStatus::Running);
    sender.release.notify_one();

    let (events, summary) = collect_until_complete(&mut rx).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipient, "a");
    assert_eq!(sender.attempted(), ["a"]);
    assert_eq!(summary.job_status, JobStatus::Cancelled);
    assert_eq!((summary.processed, summary.successful), (1, 1));
}

// ---------------------------------------------------------------------------
// Test: cancellation racing natural completion yields Completed
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_during_last_send_still_completes() {
    let (sender, controller, mut rx) = setup(ScriptedSender::delivering().holding("a"));

    let job = controller.submit(request(&["a"], 0.0, 0.0)).await.unwrap();
    sender.entered.notified().await;
    controller.cancel(job.id).await.unwrap();
    sender.release.notify_one();

    let (_, summary) = collect_until_complete(&mut rx).await;
    assert_eq!(summary.job_status, JobStatus::Completed);
    assert_eq!(summary.processed, 1);
}

// ---------------------------------------------------------------------------
// Test: measured waits stay inside the configured bounds
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn waits_before_each_attempt_stay_within_bounds() {
    let (sender, controller, mut rx) = setup(ScriptedSender::delivering());
    let bounds = DelayBounds::new(2.0, 5.0).unwrap();

    let submitted_at = Instant::now();
    controller
        .submit(request(&["a", "b", "c", "d", "e", "f"], 2.0, 5.0))
        .await
        .unwrap();
    collect_until_complete(&mut rx).await;

    let times = sender.attempt_times();
    assert_eq!(times.len(), 6);

    let mut previous = submitted_at;
    for at in times {
        let waited = at - previous;
        assert!(bounds.contains(waited), "waited {waited:?}, outside [2s, 5s]");
        previous = at;
    }
}

// ---------------------------------------------------------------------------
// Test: waiting events announce each delay before the attempt
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn waiting_event_precedes_each_progress_event() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    controller.submit(request(&["a", "b"], 3.0, 3.0)).await.unwrap();

    let mut kinds = Vec::new();
    loop {
        let event = rx.recv().await.unwrap();
        if let DispatchEvent::Waiting { delay_secs, position, .. } = &event {
            assert!((delay_secs - 3.0).abs() < 1e-9);
            assert!(*position >= 1);
        }
        kinds.push(event.message_type());
        if event.is_terminal() {
            break;
        }
    }

    assert_eq!(
        kinds,
        [
            "dm_started",
            "dm_waiting",
            "dm_progress_update",
            "dm_waiting",
            "dm_progress_update",
            "dm_complete",
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: a second submission while one is running is rejected
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn second_submit_while_running_is_rejected() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let first = controller.submit(request(&["a", "b"], 5.0, 5.0)).await.unwrap();
    let second = controller.submit(request(&["x"], 0.0, 0.0)).await;

    assert_matches!(second, Err(CoreError::Conflict(msg)) if msg == "job already active");
    assert!(controller.is_busy().await);

    let (events, summary) = collect_until_complete(&mut rx).await;
    assert_eq!(summary.job_id, first.id);
    assert_eq!(summary.job_status, JobStatus::Completed);
    assert_eq!(events.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: a submission after the previous job finished is accepted
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn submit_after_terminal_job_is_accepted() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let first = controller.submit(request(&["a"], 0.0, 0.0)).await.unwrap();
    collect_until_complete(&mut rx).await;
    assert!(!controller.is_busy().await);

    let second = controller.submit(request(&["b"], 0.0, 0.0)).await.unwrap();
    assert_ne!(first.id, second.id);

    // The earlier job has been released.
    assert_matches!(
        controller.status(first.id).await,
        Err(CoreError::NotFound { entity: "Job", .. })
    );

    let (_, summary) = collect_until_complete(&mut rx).await;
    assert_eq!(summary.job_id, second.id);
}

// ---------------------------------------------------------------------------
// Test: terminal status snapshots are stable
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn terminal_status_is_idempotent() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let job = controller.submit(request(&["a", "b"], 0.0, 0.0)).await.unwrap();
    collect_until_complete(&mut rx).await;

    let first = controller.status(job.id).await.unwrap();
    let second = controller.status(job.id).await.unwrap();
    assert_eq!(first, second);
    assert!(first.finished_at.is_some());

    // Cancelling a finished job is acknowledged and changes nothing.
    assert_eq!(controller.cancel(job.id).await.unwrap(), JobStatus::Completed);
    assert_eq!(controller.status(job.id).await.unwrap(), first);
}

// ---------------------------------------------------------------------------
// Test: unknown ids are NotFound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (_sender, controller, _rx) = setup(ScriptedSender::delivering());
    let id = JobId::new_v4();

    assert_matches!(controller.cancel(id).await, Err(CoreError::NotFound { .. }));
    assert_matches!(controller.status(id).await, Err(CoreError::NotFound { .. }));
    assert!(controller.current().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: an observer joining mid-job recovers totals from status
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn late_observer_recovers_totals_from_status() {
    let sender = Arc::new(ScriptedSender::delivering());
    let bus = Arc::new(EventBus::default());
    let mut early = bus.subscribe();
    let controller = JobController::new(Arc::clone(&sender) as Arc<dyn MessageSender>, Arc::clone(&bus));

    let job = controller.submit(request(&["a", "b", "c"], 1.0, 1.0)).await.unwrap();
    wait_for_progress(&mut early, 2).await;

    let mut late = bus.subscribe();
    let snapshot = controller.current().await.unwrap();
    assert_eq!(snapshot.id, job.id);
    assert_eq!(snapshot.processed, 2);

    let (events, summary) = collect_until_complete(&mut late).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].current, 3);
    assert_eq!(summary.successful, 3);
}

// ---------------------------------------------------------------------------
// Test: shutdown cancels the running job and refuses new work
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_running_job() {
    let (_sender, controller, mut rx) = setup(ScriptedSender::delivering());

    let job = controller.submit(request(&["a", "b", "c"], 30.0, 30.0)).await.unwrap();
    controller.shutdown().await;

    let (_, summary) = collect_until_complete(&mut rx).await;
    assert_eq!(summary.job_status, JobStatus::Cancelled);
    assert_eq!(summary.processed, 0);
    assert_eq!(
        controller.status(job.id).await.unwrap().status,
        JobStatus::Cancelled
    );

    assert_matches!(
        controller.submit(request(&["z"], 0.0, 0.0)).await,
        Err(CoreError::Conflict(_))
    );
}

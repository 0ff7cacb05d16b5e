//! WebSocket message type constants for dispatch events.
//!
//! Used by the API's progress forwarder when broadcasting job updates to
//! connected observers.

/// Dispatch loop started for a newly admitted job.
pub const MSG_TYPE_DM_STARTED: &str = "dm_started";

/// The loop is waiting before the next attempt (carries the delay).
pub const MSG_TYPE_DM_WAITING: &str = "dm_waiting";

/// One attempt finished (ProgressEvent fields).
pub const MSG_TYPE_DM_PROGRESS: &str = "dm_progress_update";

/// Job reached a terminal status (completion summary).
pub const MSG_TYPE_DM_COMPLETE: &str = "dm_complete";

/// Snapshot of the current job, sent to an observer when it connects.
pub const MSG_TYPE_DM_STATUS: &str = "dm_status";

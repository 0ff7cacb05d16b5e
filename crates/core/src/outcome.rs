//! Send outcome taxonomy.
//!
//! A [`SendOutcome`] is what the platform adapter reports for one attempt.
//! [`SendOutcome::classify`] splits it into a per-recipient result that is
//! counted and tolerated, or a session-level failure that ends the job.

use serde::{Deserialize, Serialize};

/// Raw result of a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message reached the recipient's inbox.
    Delivered,
    /// The recipient blocks messages, does not exist, or cannot be messaged.
    RecipientUnreachable { reason: String },
    /// The platform throttled this recipient or this action.
    RateLimited { reason: String },
    /// Network or protocol failure while talking to the platform.
    TransportError { reason: String },
    /// The sending identity is no longer authenticated.
    SessionLost { reason: String },
}

/// Counted outcome kinds, as reported in progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Delivered,
    RecipientUnreachable,
    RateLimited,
    TransportError,
}

impl OutcomeKind {
    pub fn is_success(self) -> bool {
        matches!(self, OutcomeKind::Delivered)
    }

    /// Coarse `success` / `failed` label shown next to each recipient.
    pub fn status(self) -> AttemptStatus {
        if self.is_success() {
            AttemptStatus::Success
        } else {
            AttemptStatus::Failed
        }
    }
}

/// Coarse result of a counted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Failed,
}

/// What the dispatch loop does with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Count the attempt and move on to the next recipient.
    Counted {
        kind: OutcomeKind,
        reason: Option<String>,
    },
    /// Abort the job; the attempt is not counted.
    Fatal { reason: String },
}

impl SendOutcome {
    pub fn classify(self) -> Disposition {
        match self {
            SendOutcome::Delivered => Disposition::Counted {
                kind: OutcomeKind::Delivered,
                reason: None,
            },
            SendOutcome::RecipientUnreachable { reason } => Disposition::Counted {
                kind: OutcomeKind::RecipientUnreachable,
                reason: Some(reason),
            },
            SendOutcome::RateLimited { reason } => Disposition::Counted {
                kind: OutcomeKind::RateLimited,
                reason: Some(reason),
            },
            SendOutcome::TransportError { reason } => Disposition::Counted {
                kind: OutcomeKind::TransportError,
                reason: Some(reason),
            },
            SendOutcome::SessionLost { reason } => Disposition::Fatal { reason },
        }
    }
}

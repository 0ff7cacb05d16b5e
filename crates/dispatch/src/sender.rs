//! Seams to the social platform.
//!
//! Implementations live outside the engine (see the `herald-gateway` crate
//! for the HTTP one). Both traits assume an already authenticated identity
//! and report its loss as a distinct, fatal result.

use async_trait::async_trait;
use herald_core::extraction::ExtractionKind;
use herald_core::outcome::SendOutcome;

/// Sends one direct message on behalf of the authenticated identity.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Attempt exactly one delivery of `message` to `recipient`.
    ///
    /// Never retries internally; the dispatch loop decides what happens
    /// next from the returned [`SendOutcome`].
    async fn send(&self, recipient: &str, message: &str) -> SendOutcome;
}

/// Errors from a [`RecipientSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The sending identity is no longer authenticated.
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// The target account does not exist or is not visible.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Anything else that went wrong upstream.
    #[error("Extraction failed: {0}")]
    Upstream(String),
}

/// Reads the followers or following of a target account.
#[async_trait]
pub trait RecipientSource: Send + Sync {
    /// Return up to `max_count` usernames, in the platform's order.
    async fn fetch(
        &self,
        target: &str,
        kind: ExtractionKind,
        max_count: usize,
    ) -> Result<Vec<String>, SourceError>;
}

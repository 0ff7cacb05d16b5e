//! Herald mass-dispatch engine.
//!
//! [`JobController`] admits one job at a time and runs it as a single
//! background task: for each recipient it waits a jittered delay, calls the
//! external [`MessageSender`], counts the outcome, and publishes progress on
//! the [`EventBus`](herald_events::EventBus).
//!
//! The platform itself stays outside this crate behind two traits:
//! [`MessageSender`] for sending and [`RecipientSource`] for extraction.

pub mod controller;
pub mod extract;
pub mod handle;
mod runner;
pub mod sender;

pub use controller::JobController;
pub use extract::{extract_recipients, ExtractError};
pub use handle::JobHandle;
pub use sender::{MessageSender, RecipientSource, SourceError};

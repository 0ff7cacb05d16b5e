//! Herald domain core.
//!
//! Pure types and functions shared by the dispatch engine, the gateway
//! adapter, and the HTTP layer. Has no internal workspace dependencies.

pub mod delay;
pub mod error;
pub mod extraction;
pub mod job;
pub mod messages;
pub mod outcome;
pub mod progress;
pub mod selection;
pub mod types;

//! HTTP adapter between the dispatch engine and the platform gateway.
//!
//! [`GatewayClient`] implements both engine seams,
//! [`MessageSender`](herald_dispatch::MessageSender) and
//! [`RecipientSource`](herald_dispatch::RecipientSource), against a small
//! REST gateway that holds the authenticated platform session.

pub mod client;
pub mod config;
pub mod error;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::GatewayError;

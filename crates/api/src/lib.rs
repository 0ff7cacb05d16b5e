//! Herald API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! session extraction, WebSocket infrastructure, progress forwarding) so
//! integration tests and the binary entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod progress;
pub mod response;
pub mod router;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod ws;

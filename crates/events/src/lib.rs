//! Herald progress event bus.
//!
//! - [`DispatchEvent`]: everything the dispatch loop tells observers.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Publishing never blocks the loop.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::DispatchEvent;

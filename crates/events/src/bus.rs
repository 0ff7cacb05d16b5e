//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DispatchEvent`]s. It is
//! shared via `Arc<EventBus>` between the controller and every observer.

use tokio::sync::broadcast;

use crate::event::DispatchEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Subscribers only see events published after they subscribed; there is no
/// replay. Observers that join mid-job recover totals from the controller's
/// status query instead.
///
/// # Usage
///
/// ```rust
/// use herald_core::types::JobId;
/// use herald_events::{DispatchEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DispatchEvent::started(JobId::nil(), 3));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe a `RecvError::Lagged`. The publisher is
    /// never blocked.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers the event was handed to. With no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: DispatchEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!("Dispatch event dropped, no subscribers");
                0
            }
        }
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

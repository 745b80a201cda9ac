//! Hook for unsolicited server events.

use tokio::sync::broadcast;
use zwassoc_protocol::EventMessage;

/// Receives every `event` message the server sends.
///
/// Called from the connection's read loop, so implementations must not block.
pub trait EventHandler: Send + Sync + 'static {
    fn on_event(&self, event: EventMessage);
}

/// Default handler: drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardEvents;

impl EventHandler for DiscardEvents {
    fn on_event(&self, _event: EventMessage) {}
}

/// Fans events out to every subscribed receiver. Events sent while nobody is
/// subscribed are lost.
impl EventHandler for broadcast::Sender<EventMessage> {
    fn on_event(&self, event: EventMessage) {
        let _ = self.send(event);
    }
}

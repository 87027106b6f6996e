use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::BookingEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for per-conference booking events. The engine publishes the
/// facts (slot freed, deadline set, booking canceled); delivering them to
/// actual users is an external collaborator's concern.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<BookingEvent>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to events for a conference. Creates the channel if needed.
    pub fn subscribe(&self, conference: &str) -> broadcast::Receiver<BookingEvent> {
        let sender = self
            .channels
            .entry(conference.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish an event. No-op if nobody is listening.
    pub fn send(&self, conference: &str, event: &BookingEvent) {
        if let Some(sender) = self.channels.get(conference) {
            let _ = sender.send(event.clone());
        }
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

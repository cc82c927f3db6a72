//! Session-scoped pub-sub for retry progress, data refresh and background
//! failures. Each [`EventBus`] is independent; nothing here is global.

use tokio::sync::broadcast;

use streamcal_core::YearMonth;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A call is about to be retried. `attempt` counts from 1.
    Retry {
        operation: String,
        attempt: u32,
        max_retries: u32,
    },
    /// New data landed for these months; listeners should re-read.
    EventsChanged { months: Vec<YearMonth> },
    /// A background task failed.
    Error { operation: String, message: String },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Returns how many listeners received the event. Zero listeners is not an error.
    pub fn publish(&self, event: ClientEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! Fire-and-forget work with observable completion.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::{ClientEvent, EventBus};

/// Runs side-effect writes in the background. Failures are logged and
/// published as [`ClientEvent::Error`]; [`BackgroundQueue::flush`] waits for
/// everything queued so far.
pub struct BackgroundQueue {
    bus: EventBus,
    pending: Mutex<Vec<JoinHandle<bool>>>,
}

impl BackgroundQueue {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn spawn<F>(&self, operation: &'static str, task: F)
    where
        F: Future<Output = streamcal_core::Result<()>> + Send + 'static,
    {
        let bus = self.bus.clone();
        let handle = tokio::spawn(async move {
            match task.await {
                Ok(()) => {
                    debug!(operation, "background task finished");
                    true
                }
                Err(err) => {
                    warn!(operation, error = %err, "background task failed");
                    bus.publish(ClientEvent::Error {
                        operation: operation.to_string(),
                        message: err.to_string(),
                    });
                    false
                }
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Awaits every task queued before the call. Returns `(succeeded, failed)`
    /// among those still pending at flush time.
    pub async fn flush(&self) -> (usize, usize) {
        let handles: Vec<JoinHandle<bool>> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };

        let mut succeeded = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.await {
                Ok(true) => succeeded += 1,
                // A panicked task counts as failed.
                Ok(false) | Err(_) => failed += 1,
            }
        }
        (succeeded, failed)
    }

    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }
}

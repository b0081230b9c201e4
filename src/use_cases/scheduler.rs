// Delayed engine events with explicit cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::types::EngineEvent;

/// Shared flag that aborts pending work once set.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (cancelled, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(cancelled),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        // The sender lives in `self`, so this only returns once the flag flips.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// A pending delayed event. Dropping it cancels the delivery.
#[derive(Debug)]
pub struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Delivers engine events back into the engine's own input channel after a delay.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    // Weak so pending timers never keep the engine's input channel open.
    input_tx: mpsc::WeakSender<EngineEvent>,
}

impl EventScheduler {
    pub fn new(input_tx: &mpsc::Sender<EngineEvent>) -> Self {
        Self {
            input_tx: input_tx.downgrade(),
        }
    }

    pub fn schedule(
        &self,
        delay: Duration,
        event: EngineEvent,
        token: CancellationToken,
    ) -> ScheduledTask {
        let input_tx = self.input_tx.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    debug!(?event, "scheduled event cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if task_token.is_cancelled() {
                        return;
                    }
                    let Some(input_tx) = input_tx.upgrade() else {
                        debug!(?event, "engine gone; dropping scheduled event");
                        return;
                    };
                    if input_tx.send(event).await.is_err() {
                        debug!("engine input closed; scheduled event dropped");
                    }
                }
            }
        });

        ScheduledTask { token, handle }
    }
}

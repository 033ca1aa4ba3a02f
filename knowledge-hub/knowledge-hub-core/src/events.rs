use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::{DocumentId, Permission, UserId};

/// Document lifecycle change, published after the owning transaction commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    Created { id: DocumentId, author: UserId },
    Updated { id: DocumentId, by: UserId, version: Option<i64> },
    Deleted { id: DocumentId, by: UserId },
    Shared { id: DocumentId, user: UserId, permission: Permission },
    Unshared { id: DocumentId, user: UserId },
}

/// Slow subscribers lag past this many events and get `RecvError::Lagged`.
const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of [`Event`]s to any number of in-process listeners.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publishes `event` and returns how many listeners will see it. With no
    /// listeners the event is dropped.
    pub fn send(&self, event: Event) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => {
                trace!(receivers, "event published");
                receivers
            }
            Err(broadcast::error::SendError(event)) => {
                trace!(?event, "event dropped, no listeners");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

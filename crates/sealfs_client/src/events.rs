//! Entry-synced notifications.

use sealfs_types::EntryId;
use tokio::sync::broadcast;

/// Notification published by the syncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// An entry completed a sync cycle and its local manifest was updated.
    EntrySynced {
        /// Path of the entry within the workspace.
        path: String,
        /// Identity of the synced entry.
        entry_id: EntryId,
    },
}

/// Fire-and-forget broadcast channel for sync events.
///
/// Delivery is best effort: publishing never blocks, publishing with no
/// subscribers is a no-op, and a subscriber that lags behind the channel
/// capacity observes a gap.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: SyncEvent) {
        // Send only fails when there is no subscriber, which is fine.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let entry_id = EntryId::generate();
        bus.publish(SyncEvent::EntrySynced {
            path: "/docs".to_owned(),
            entry_id,
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            SyncEvent::EntrySynced {
                path: "/docs".to_owned(),
                entry_id,
            }
        );
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::new(8);
        bus.publish(SyncEvent::EntrySynced {
            path: "/".to_owned(),
            entry_id: EntryId::generate(),
        });
    }
}

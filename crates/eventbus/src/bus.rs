//! Per-document broadcast topics.
//!
//! Uses [`tokio::sync::broadcast`] for fan-out delivery to every session on
//! a document. Topics are sharded by workflow id so unrelated documents
//! never contend on shared state.

use dashmap::DashMap;
use tapestry_core::WorkflowId;
use tokio::sync::broadcast;

use crate::event::WorkflowEvent;

/// Default per-topic channel capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Broadcast-based event bus with one topic per document.
///
/// Delivers events to all sessions subscribed to the event's document. If no
/// subscribers are listening, events are silently dropped (fire-and-forget).
pub struct EventBus {
    topics: DashMap<WorkflowId, broadcast::Sender<WorkflowEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create an event bus with the default per-topic capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an event bus with the given per-topic channel capacity.
    ///
    /// When a topic's channel is full, the oldest events are dropped and
    /// lagging subscribers observe a gap rather than blocking the sender.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    /// Broadcast an event on its document's topic.
    ///
    /// Returns silently if nobody is subscribed to that document.
    pub fn broadcast(&self, event: WorkflowEvent) {
        if let Some(sender) = self.topics.get(&event.workflow_id()) {
            // Ignore send error (no active receivers).
            let _ = sender.send(event);
        }
    }

    /// Subscribe to a document's topic.
    pub fn subscribe(&self, workflow_id: WorkflowId) -> EventSubscriber {
        let sender = self
            .topics
            .entry(workflow_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        EventSubscriber {
            receiver: sender.subscribe(),
        }
    }

    /// Number of active subscribers on a document's topic.
    #[must_use]
    pub fn subscriber_count(&self, workflow_id: WorkflowId) -> usize {
        self.topics
            .get(&workflow_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Drop topics that no longer have any subscribers.
    pub fn prune(&self) {
        self.topics.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription handle for receiving events from one document topic.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<WorkflowEvent>,
}

impl EventSubscriber {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Returns `None` once the topic is closed. Lag (missed events due to
    /// buffer overflow) is skipped over: the next available event is
    /// returned, matching the eventually-consistent delivery contract.
    pub async fn recv(&mut self) -> Option<WorkflowEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is immediately available.
    pub fn try_recv(&mut self) -> Option<WorkflowEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapestry_core::LockVersion;

    fn updated(workflow_id: WorkflowId, version: u64) -> WorkflowEvent {
        WorkflowEvent::DocumentUpdated {
            workflow_id,
            lock_version: LockVersion::new(version),
        }
    }

    #[test]
    fn broadcast_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.broadcast(updated(WorkflowId::v4(), 1));
    }

    #[test]
    fn subscriber_receives_via_try_recv() {
        let bus = EventBus::new();
        let id = WorkflowId::v4();
        let mut sub = bus.subscribe(id);

        bus.broadcast(updated(id, 2));

        assert_eq!(sub.try_recv(), Some(updated(id, 2)));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn subscriber_receives_via_recv() {
        let bus = EventBus::new();
        let id = WorkflowId::v4();
        let mut sub = bus.subscribe(id);

        bus.broadcast(updated(id, 3));

        assert_eq!(sub.recv().await, Some(updated(id, 3)));
    }

    #[test]
    fn topics_are_isolated_per_document() {
        let bus = EventBus::new();
        let doc_a = WorkflowId::v4();
        let doc_b = WorkflowId::v4();
        let mut sub_a = bus.subscribe(doc_a);
        let mut sub_b = bus.subscribe(doc_b);

        bus.broadcast(updated(doc_a, 2));

        assert!(sub_a.try_recv().is_some());
        assert!(sub_b.try_recv().is_none());
    }

    #[test]
    fn multiple_subscribers_each_get_a_copy() {
        let bus = EventBus::new();
        let id = WorkflowId::v4();
        let mut sub1 = bus.subscribe(id);
        let mut sub2 = bus.subscribe(id);

        bus.broadcast(WorkflowEvent::PresenceChanged { workflow_id: id });

        assert!(sub1.try_recv().is_some());
        assert!(sub2.try_recv().is_some());
    }

    #[test]
    fn subscriber_count_tracks_active_subscriptions() {
        let bus = EventBus::new();
        let id = WorkflowId::v4();
        assert_eq!(bus.subscriber_count(id), 0);

        let sub1 = bus.subscribe(id);
        let sub2 = bus.subscribe(id);
        assert_eq!(bus.subscriber_count(id), 2);

        drop(sub1);
        drop(sub2);
        assert_eq!(bus.subscriber_count(id), 0);
    }

    #[test]
    fn prune_drops_empty_topics() {
        let bus = EventBus::new();
        let id = WorkflowId::v4();
        let sub = bus.subscribe(id);
        drop(sub);

        bus.prune();
        assert_eq!(bus.subscriber_count(id), 0);
        // A fresh subscription recreates the topic transparently.
        let mut sub = bus.subscribe(id);
        bus.broadcast(updated(id, 5));
        assert!(sub.try_recv().is_some());
    }

    #[test]
    fn lagged_subscriber_skips_to_available_events() {
        let bus = EventBus::with_capacity(2);
        let id = WorkflowId::v4();
        let mut sub = bus.subscribe(id);

        for version in 1..=5 {
            bus.broadcast(updated(id, version));
        }

        // The two newest events survive; the gap is skipped silently.
        assert_eq!(sub.try_recv(), Some(updated(id, 4)));
        assert_eq!(sub.try_recv(), Some(updated(id, 5)));
        assert_eq!(sub.try_recv(), None);
    }
}

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::BlogEvent;

/// In-process fan-out of write events, backed by `tokio::broadcast`.
/// Single-node; the persistence layer is the source of truth, the bus is
/// only a notification channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<BlogEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish to all current subscribers, returning how many received
    /// the event. A bus with no listeners drops the event; a write never
    /// fails because nobody is watching.
    pub fn publish(&self, event: BlogEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlogEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::TagEvent;

    fn tag_event() -> BlogEvent {
        BlogEvent::TagSaved(TagEvent {
            name: "rust".into(),
            slug: "rust".into(),
        })
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(tag_event()), 1);
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, BlogEvent::TagSaved(_)));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(tag_event()), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(tag_event());
        assert!(matches!(rx1.recv().await.unwrap(), BlogEvent::TagSaved(_)));
        assert!(matches!(rx2.recv().await.unwrap(), BlogEvent::TagSaved(_)));
    }
}

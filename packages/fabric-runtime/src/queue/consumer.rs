//! Consumer half of C7: `subscribe()` is implicit on construction,
//! `poll(duration)` drains what's available (waiting up to the timeout for
//! the first message if the queue is currently empty), `commit()` is a
//! no-op for the in-memory transport, `unsubscribe()` releases the handle.

use std::sync::Arc;
use std::time::Duration;

use super::message::QueueMessage;
use super::registry::TopicRegistry;

/// A consumer bound to one topic. Subscription is implicit: constructing
/// this handle is the subscribe call.
pub struct QueueConsumer {
    topic: String,
    registry: Arc<TopicRegistry>,
}

impl QueueConsumer {
    #[must_use]
    pub fn new(topic: impl Into<String>, registry: Arc<TopicRegistry>) -> Self {
        Self {
            topic: topic.into(),
            registry,
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn poll(&self, timeout: Duration) -> Vec<QueueMessage> {
        self.registry.poll(&self.topic, timeout).await
    }

    /// No-op for the in-memory transport; kept so the same consumer
    /// contract serves distributed transports that need an explicit ack.
    pub fn commit(&self) {}

    /// Releases the registry handle. Consuming `self` makes further use a
    /// compile error rather than a silent no-op.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::producer::QueueProducer;

    #[tokio::test]
    async fn poll_returns_messages_sent_by_a_producer() {
        let registry = Arc::new(TopicRegistry::new());
        let producer = QueueProducer::new("t1", registry.clone());
        let consumer = QueueConsumer::new("t1", registry);

        producer.send(QueueMessage::new(b"hello".to_vec()), None);
        let messages = consumer.poll(Duration::from_millis(50)).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload, b"hello");
    }

    #[tokio::test]
    async fn commit_is_a_harmless_no_op() {
        let registry = Arc::new(TopicRegistry::new());
        let consumer = QueueConsumer::new("t1", registry);
        consumer.commit();
    }
}

//! In-memory topic registry (C6): a process-wide mapping from topic name to
//! an unbounded FIFO queue, created lazily on first use by either a
//! producer or a consumer. Multi-producer / multi-consumer, thread-safe;
//! order within one topic is the linearized order of successful sends.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::message::QueueMessage;

struct Topic {
    queue: Mutex<VecDeque<QueueMessage>>,
    notify: Notify,
}

impl Topic {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

/// Process-wide registry of named FIFO queues.
pub struct TopicRegistry {
    topics: DashMap<String, Arc<Topic>>,
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { topics: DashMap::new() }
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Topic::new()))
            .clone()
    }

    /// Enqueues a message on `topic`, waking one waiting poller if any.
    pub fn enqueue(&self, topic: &str, message: QueueMessage) {
        let t = self.topic(topic);
        t.queue.lock().push_back(message);
        t.notify.notify_one();
    }

    /// Drains whatever is currently queued on `topic`; if nothing is
    /// available, waits up to `timeout` for the first message to arrive,
    /// then returns whatever has accumulated (possibly still empty).
    pub async fn poll(&self, topic: &str, timeout: Duration) -> Vec<QueueMessage> {
        let t = self.topic(topic);
        let notified = t.notify.notified();
        {
            let mut q = t.queue.lock();
            if !q.is_empty() {
                return q.drain(..).collect();
            }
        }
        let _ = tokio::time::timeout(timeout, notified).await;
        t.queue.lock().drain(..).collect()
    }

    /// Number of messages currently queued for `topic`, without draining.
    /// Intended for diagnostics and tests.
    #[must_use]
    pub fn depth(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, |t| t.queue.lock().len())
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_poll_drains_in_order() {
        let registry = TopicRegistry::new();
        registry.enqueue("t1", QueueMessage::new(b"a".to_vec()));
        registry.enqueue("t1", QueueMessage::new(b"b".to_vec()));

        let drained = registry.poll("t1", Duration::from_millis(50)).await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload, b"a");
        assert_eq!(drained[1].payload, b"b");
    }

    #[tokio::test]
    async fn poll_on_empty_topic_times_out_with_empty_result() {
        let registry = TopicRegistry::new();
        let drained = registry.poll("empty", Duration::from_millis(20)).await;
        assert!(drained.is_empty());
    }

    #[tokio::test]
    async fn poll_wakes_up_on_late_arrival() {
        let registry = Arc::new(TopicRegistry::new());
        let r2 = registry.clone();
        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            r2.enqueue("t2", QueueMessage::new(b"late".to_vec()));
        });

        let drained = registry.poll("t2", Duration::from_millis(500)).await;
        producer.await.unwrap();
        assert_eq!(drained.len(), 1);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let registry = TopicRegistry::new();
        registry.enqueue("a", QueueMessage::new(b"x".to_vec()));
        let drained_b = registry.poll("b", Duration::from_millis(20)).await;
        assert!(drained_b.is_empty());
        assert_eq!(registry.depth("a"), 1);
    }
}

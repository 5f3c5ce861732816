//! Producer half of C7: a thin handle that enqueues onto a named topic in
//! the shared [`TopicRegistry`].

use std::sync::Arc;

use super::message::QueueMessage;
use super::registry::TopicRegistry;

/// A producer bound to one topic.
#[derive(Clone)]
pub struct QueueProducer {
    topic: String,
    registry: Arc<TopicRegistry>,
}

impl QueueProducer {
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

    /// Enqueues `message`. The in-memory transport cannot fail, so the
    /// callback -- kept for parity with transports that can -- always sees
    /// success; it exists so callers can write transport-agnostic code.
    pub fn send(&self, message: QueueMessage, callback: Option<Box<dyn FnOnce(SendResult) + Send>>) {
        self.registry.enqueue(&self.topic, message);
        if let Some(cb) = callback {
            cb(Ok(()));
        }
    }
}

pub type SendResult = Result<(), SendError>;

/// Placeholder failure kind for transports where `send` can fail. The
/// in-memory transport never produces one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("queue send failed")]
pub struct SendError;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn send_enqueues_and_invokes_callback() {
        let registry = Arc::new(TopicRegistry::new());
        let producer = QueueProducer::new("t1", registry.clone());

        let callback_result = Arc::new(Mutex::new(None));
        let cr = callback_result.clone();
        producer.send(
            QueueMessage::new(b"hi".to_vec()),
            Some(Box::new(move |r| *cr.lock().unwrap() = Some(r))),
        );

        assert!(callback_result.lock().unwrap().as_ref().unwrap().is_ok());
        let drained = registry.poll("t1", Duration::from_millis(20)).await;
        assert_eq!(drained.len(), 1);
    }
}

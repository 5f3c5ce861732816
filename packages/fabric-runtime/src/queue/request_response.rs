//! Request/response correlation template (C8): wraps a producer (requests)
//! and a consumer (responses) to expose `send(request) -> future(response)`,
//! with bounded pending-request tracking and per-call deadlines.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::consumer::QueueConsumer;
use super::message::QueueMessage;
use super::producer::QueueProducer;

/// Outcome of a pending request that did not receive a normal response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestResponseError {
    /// `send` was rejected because `pending.len() >= max_pending_requests`.
    #[error("request/response pending queue is full")]
    QueueFull,
    /// No response arrived before the request's deadline.
    #[error("request timed out")]
    Timeout,
    /// The template was shut down while this request was outstanding.
    #[error("request cancelled by shutdown")]
    Cancelled,
}

/// Configuration for one request/response template instance.
#[derive(Debug, Clone)]
pub struct RequestResponseConfig {
    pub max_pending_requests: usize,
    pub max_request_timeout: Duration,
    pub poll_interval: Duration,
}

type PendingSender = oneshot::Sender<Result<QueueMessage, RequestResponseError>>;

struct PendingEntry {
    sender: PendingSender,
    deadline: Instant,
}

/// Correlates requests sent through a producer to responses read from a
/// consumer by a request id stamped on every outgoing message.
pub struct RequestResponseTemplate {
    producer: QueueProducer,
    pending: Arc<DashMap<Uuid, PendingEntry>>,
    config: RequestResponseConfig,
    shutdown: Arc<Notify>,
    poller: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl RequestResponseTemplate {
    #[must_use]
    pub fn new(producer: QueueProducer, consumer: QueueConsumer, config: RequestResponseConfig) -> Arc<Self> {
        let pending: Arc<DashMap<Uuid, PendingEntry>> = Arc::new(DashMap::new());
        let shutdown = Arc::new(Notify::new());

        let poller = spawn_poller(consumer, pending.clone(), shutdown.clone());
        let ticker = spawn_ticker(config.poll_interval, pending.clone(), shutdown.clone());

        Arc::new(Self {
            producer,
            pending,
            config,
            shutdown,
            poller,
            ticker,
        })
    }

    /// Stamps `request` with a fresh request id, records a pending entry
    /// with a deadline of `now + max_request_timeout`, enqueues it, and
    /// returns a receiver that completes exactly once: on response
    /// arrival, on timeout, or on shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`RequestResponseError::QueueFull`] synchronously, without
    /// enqueuing anything, if the pending set is already at capacity.
    pub fn send(
        &self,
        mut request: QueueMessage,
    ) -> Result<oneshot::Receiver<Result<QueueMessage, RequestResponseError>>, RequestResponseError> {
        if self.pending.len() >= self.config.max_pending_requests {
            return Err(RequestResponseError::QueueFull);
        }

        let request_id = Uuid::new_v4();
        request.correlation_id = Some(request_id);

        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + self.config.max_request_timeout;
        self.pending.insert(request_id, PendingEntry { sender: tx, deadline });

        self.producer.send(request, None);
        Ok(rx)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cancels every outstanding request with [`RequestResponseError::Cancelled`]
    /// and stops the background poller and timeout tick.
    pub async fn shutdown(&self) {
        self.shutdown.notify_waiters();

        let ids: Vec<Uuid> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, entry)) = self.pending.remove(&id) {
                let _ = entry.sender.send(Err(RequestResponseError::Cancelled));
            }
        }

        self.poller.abort();
        self.ticker.abort();
    }
}

fn spawn_poller(
    consumer: QueueConsumer,
    pending: Arc<DashMap<Uuid, PendingEntry>>,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let poll_timeout = Duration::from_millis(50);
            tokio::select! {
                () = shutdown.notified() => break,
                messages = consumer.poll(poll_timeout) => {
                    for message in messages {
                        handle_response(&pending, message);
                    }
                }
            }
        }
    })
}

fn handle_response(pending: &DashMap<Uuid, PendingEntry>, message: QueueMessage) {
    let Some(id) = message.correlation_id else {
        tracing::warn!("response missing correlation id; discarding");
        return;
    };
    match pending.remove(&id) {
        Some((_, entry)) => {
            let _ = entry.sender.send(Ok(message));
        }
        None => {
            tracing::warn!(request_id = %id, "response for unknown or already-completed request; discarding");
        }
    }
}

fn spawn_ticker(
    interval: Duration,
    pending: Arc<DashMap<Uuid, PendingEntry>>,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                () = shutdown.notified() => break,
                _ = ticker.tick() => sweep_timeouts(&pending),
            }
        }
    })
}

fn sweep_timeouts(pending: &DashMap<Uuid, PendingEntry>) {
    let now = Instant::now();
    let expired: Vec<Uuid> = pending
        .iter()
        .filter(|entry| entry.deadline <= now)
        .map(|entry| *entry.key())
        .collect();

    for id in expired {
        if let Some((_, entry)) = pending.remove(&id) {
            let _ = entry.sender.send(Err(RequestResponseError::Timeout));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::queue::registry::TopicRegistry;

    fn template(registry: Arc<TopicRegistry>, config: RequestResponseConfig) -> Arc<RequestResponseTemplate> {
        let producer = QueueProducer::new("requests", registry.clone());
        let consumer = QueueConsumer::new("responses", registry);
        RequestResponseTemplate::new(producer, consumer, config)
    }

    #[tokio::test]
    async fn send_completes_on_matching_response() {
        let registry = Arc::new(TopicRegistry::new());
        let rr = template(
            registry.clone(),
            RequestResponseConfig {
                max_pending_requests: 10,
                max_request_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(10),
            },
        );

        let rx = rr.send(QueueMessage::new(b"ping".to_vec())).unwrap();

        // Simulate a peer reading the request, echoing its correlation id back.
        let sent = registry.poll("requests", Duration::from_millis(200)).await;
        assert_eq!(sent.len(), 1);
        let mut response = QueueMessage::new(b"pong".to_vec());
        response.correlation_id = sent[0].correlation_id;
        registry.enqueue("responses", response);

        let outcome = tokio::time::timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
        assert_eq!(outcome.unwrap().payload, b"pong");

        rr.shutdown().await;
    }

    #[tokio::test]
    async fn send_times_out_when_nothing_responds() {
        let registry = Arc::new(TopicRegistry::new());
        let rr = template(
            registry,
            RequestResponseConfig {
                max_pending_requests: 10,
                max_request_timeout: Duration::from_millis(50),
                poll_interval: Duration::from_millis(10),
            },
        );

        let rx = rr.send(QueueMessage::new(b"ping".to_vec())).unwrap();
        let outcome = tokio::time::timeout(Duration::from_millis(500), rx).await.unwrap().unwrap();
        assert_eq!(outcome.unwrap_err(), RequestResponseError::Timeout);

        rr.shutdown().await;
    }

    #[tokio::test]
    async fn send_rejects_once_pending_is_at_capacity() {
        let registry = Arc::new(TopicRegistry::new());
        let rr = template(
            registry,
            RequestResponseConfig {
                max_pending_requests: 2,
                max_request_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(10),
            },
        );

        let _a = rr.send(QueueMessage::new(b"a".to_vec())).unwrap();
        let _b = rr.send(QueueMessage::new(b"b".to_vec())).unwrap();
        let third = rr.send(QueueMessage::new(b"c".to_vec()));
        assert_eq!(third.unwrap_err(), RequestResponseError::QueueFull);

        rr.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_cancels_outstanding_requests() {
        let registry = Arc::new(TopicRegistry::new());
        let rr = template(
            registry,
            RequestResponseConfig {
                max_pending_requests: 10,
                max_request_timeout: Duration::from_secs(30),
                poll_interval: Duration::from_millis(10),
            },
        );

        let rx = rr.send(QueueMessage::new(b"a".to_vec())).unwrap();
        rr.shutdown().await;

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.unwrap_err(), RequestResponseError::Cancelled);
    }
}

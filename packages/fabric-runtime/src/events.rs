//! Cluster-change event plane (C5): synchronous, in-process fan-out of
//! partition-ownership and topology changes to registered subscribers.
//!
//! Delivery happens inline with `recalculate_partitions`; subscribers must
//! not re-enter the partition service from within their handler. A
//! subscriber that panics is caught and logged -- it never blocks delivery
//! to the remaining subscribers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use iot_fabric_core::{ServiceKey, TopicPartitionInfo};
use parking_lot::RwLock;

/// A partition-ownership change for one `ServiceKey`, emitted whenever a
/// recomputation changes the local instance's owned partition list for
/// that key.
#[derive(Debug, Clone)]
pub struct PartitionChangeEvent {
    pub service_key: ServiceKey,
    pub tpis: Vec<TopicPartitionInfo>,
}

/// A batched notification that one or more `ServiceKey`s saw their peer
/// list change during a recomputation. At most one per recomputation.
#[derive(Debug, Clone)]
pub struct ClusterTopologyChangeEvent {
    pub changed_keys: Vec<ServiceKey>,
}

/// The two event kinds the event plane publishes.
#[derive(Debug, Clone)]
pub enum FabricEvent {
    PartitionChange(PartitionChangeEvent),
    TopologyChange(ClusterTopologyChangeEvent),
}

pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn(&FabricEvent) + Send + Sync>;

/// Registers subscribers and fans out events to them in registration order.
pub struct EventPublisher {
    subscribers: RwLock<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a handler, returning an id that can later be passed to
    /// [`Self::unsubscribe`]. Handlers fire in registration order.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&FabricEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().retain(|(sid, _)| *sid != id);
    }

    /// Publishes one event to every registered subscriber, in registration
    /// order. A subscriber panic is caught, logged, and does not stop
    /// delivery to the rest.
    pub fn publish(&self, event: FabricEvent) {
        let subs = self.subscribers.read().clone();
        for (id, handler) in &subs {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&event)));
            if outcome.is_err() {
                tracing::error!(subscription_id = id, "event subscriber panicked; continuing with remaining subscribers");
            }
        }
    }

    pub fn publish_partition_change(&self, event: PartitionChangeEvent) {
        self.publish(FabricEvent::PartitionChange(event));
    }

    pub fn publish_topology_change(&self, event: ClusterTopologyChangeEvent) {
        self.publish(FabricEvent::TopologyChange(event));
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

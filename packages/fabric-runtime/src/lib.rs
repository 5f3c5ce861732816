//! IoT fabric runtime -- the partition service (C4), the cluster-change
//! event plane (C5), the in-memory queue fabric (C6/C7), the
//! request/response correlation template (C8), and the ambient stack
//! (configuration, service lifecycle, graceful shutdown) that wires them
//! into a running process.
//!
//! - **Partition** ([`partition`]): [`PartitionService`], the component
//!   that turns cluster membership into entity ownership.
//! - **Events** ([`events`]): [`EventPublisher`] and the change events it
//!   fans out when ownership or topology moves.
//! - **Queue** ([`queue`]): [`TopicRegistry`] and the producer/consumer/
//!   request-response handles built on top of it.
//! - **Service info** ([`service_info`]): [`ServiceInfoProvider`], the seam
//!   production deployments plug real service discovery into.
//! - **Config** ([`config`]): [`FabricConfig`], loaded from CLI flags or
//!   environment variables.
//! - **Registry** ([`registry`]): [`ServiceRegistry`], ordered init/shutdown
//!   for long-lived components.
//! - **Shutdown** ([`shutdown`]): [`ShutdownController`], health state and
//!   in-flight request draining.

pub mod config;
pub mod events;
pub mod partition;
pub mod queue;
pub mod registry;
pub mod service_info;
pub mod shutdown;

pub use config::FabricConfig;
pub use events::{ClusterTopologyChangeEvent, EventPublisher, FabricEvent, PartitionChangeEvent, SubscriptionId};
pub use partition::{PartitionService, PartitionServiceConfig};
pub use queue::{
    QueueConsumer, QueueMessage, QueueProducer, RequestResponseConfig, RequestResponseError,
    RequestResponseTemplate, SendError, SendResult, TopicRegistry,
};
pub use registry::{ManagedService, ServiceContext, ServiceRegistry};
pub use service_info::{ServiceInfoProvider, StaticServiceInfoProvider};
pub use shutdown::{HealthState, InFlightGuard, ShutdownController};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }

    #[test]
    fn reexports_accessible() {
        let _ = crate::ShutdownController::new();
        let _ = crate::ServiceRegistry::new();
        let _ = crate::EventPublisher::new();
        let _ = crate::TopicRegistry::new();
    }
}

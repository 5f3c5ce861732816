//! Typed configuration for the fabric, loaded from CLI flags or environment
//! variables via `clap`'s derive API. Mirrors the configuration-key table
//! of the partition and request/response components; validated once at
//! construction rather than deep inside the partition service.

use std::time::Duration;

use clap::Parser;
use iot_fabric_core::HashFunction;

use crate::partition::PartitionServiceConfig;

/// Top-level fabric configuration. Every field has an environment-variable
/// fallback so the same binary works unmodified under a process manager.
#[derive(Debug, Clone, Parser)]
#[command(name = "iot-fabric", about = "Partition assignment and routing fabric")]
pub struct FabricConfig {
    /// Local instance id, advertised to peers.
    #[arg(long, env = "FABRIC_NODE_ID")]
    pub node_id: String,

    /// `queue.core.topic`
    #[arg(long, env = "QUEUE_CORE_TOPIC", default_value = "tb_core")]
    pub core_topic: String,

    /// `queue.core.partitions`
    #[arg(long, env = "QUEUE_CORE_PARTITIONS", default_value_t = 100)]
    pub core_partitions: u32,

    /// `queue.rule_engine.topic`
    #[arg(long, env = "QUEUE_RULE_ENGINE_TOPIC", default_value = "tb_rule_engine")]
    pub rule_engine_topic: String,

    /// `queue.rule_engine.partitions`
    #[arg(long, env = "QUEUE_RULE_ENGINE_PARTITIONS", default_value_t = 100)]
    pub rule_engine_partitions: u32,

    /// `queue.partitions.hash_function_name`
    #[arg(long, env = "QUEUE_PARTITIONS_HASH_FUNCTION_NAME", default_value = "murmur3_128")]
    pub hash_function_name: String,

    /// `queue.partitions.virtual_nodes_size`
    #[arg(long, env = "QUEUE_PARTITIONS_VIRTUAL_NODES_SIZE", default_value_t = 16)]
    pub virtual_nodes_size: u32,

    /// Transport-API `requestsTopic`
    #[arg(long, env = "FABRIC_REQUESTS_TOPIC", default_value = "tb_core.requests")]
    pub requests_topic: String,

    /// Transport-API `responsesTopic`
    #[arg(long, env = "FABRIC_RESPONSES_TOPIC", default_value = "tb_core.responses")]
    pub responses_topic: String,

    /// Transport-API `maxPendingRequests`
    #[arg(long, env = "FABRIC_MAX_PENDING_REQUESTS", default_value_t = 10_000)]
    pub max_pending_requests: usize,

    /// Transport-API `maxRequestsTimeout`, in milliseconds
    #[arg(long, env = "FABRIC_MAX_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub max_request_timeout_ms: u64,

    /// Transport-API `pollInterval`, in milliseconds
    #[arg(long, env = "FABRIC_POLL_INTERVAL_MS", default_value_t = 25)]
    pub poll_interval_ms: u64,
}

impl FabricConfig {
    /// Builds the partition service's configuration view, validating the
    /// hash-function name fast. Fatal at startup on an unknown name.
    ///
    /// # Errors
    ///
    /// Returns [`iot_fabric_core::FabricError`] if `hash_function_name`
    /// does not name a known hash family.
    pub fn partition_service_config(&self) -> Result<PartitionServiceConfig, iot_fabric_core::FabricError> {
        let hash_function = HashFunction::from_name(&self.hash_function_name)?;
        Ok(PartitionServiceConfig::new(
            [
                (iot_fabric_core::ServiceType::TbCore, self.core_topic.clone(), self.core_partitions),
                (
                    iot_fabric_core::ServiceType::TbRuleEngine,
                    self.rule_engine_topic.clone(),
                    self.rule_engine_partitions,
                ),
            ],
            hash_function,
            self.virtual_nodes_size,
        ))
    }

    #[must_use]
    pub fn max_request_timeout(&self) -> Duration {
        Duration::from_millis(self.max_request_timeout_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

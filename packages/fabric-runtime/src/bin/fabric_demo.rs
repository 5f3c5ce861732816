//! Demo/CLI entrypoint (A5): wires the partition service, event plane,
//! queue fabric, and request/response template into one process, logs
//! partition ownership as it stands, and drains in-flight work on Ctrl-C.
//!
//! This binary simulates cluster membership with a fixed, hard-coded peer
//! list rather than a real discovery mechanism -- wiring that in is a
//! deployment concern outside this crate's scope.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use iot_fabric_core::{ServiceInfo, ServiceType, TenantId};
use iot_fabric_runtime::{
    EventPublisher, FabricConfig, FabricEvent, PartitionService, QueueConsumer, QueueProducer,
    RequestResponseConfig, RequestResponseTemplate, ServiceInfoProvider, ShutdownController,
    StaticServiceInfoProvider, TopicRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = FabricConfig::parse();
    let partition_config = config.partition_service_config()?;

    let local = ServiceInfo::new(
        config.node_id.clone(),
        [ServiceType::TbCore.as_str().to_string(), ServiceType::TbRuleEngine.as_str().to_string()],
        TenantId::NIL,
    );
    let service_info_provider: Arc<dyn ServiceInfoProvider> =
        Arc::new(StaticServiceInfoProvider::new(local.clone()));

    let event_publisher = Arc::new(EventPublisher::new());
    event_publisher.subscribe(|event| match event {
        FabricEvent::PartitionChange(change) => {
            tracing::info!(
                service_type = ?change.service_key.service_type,
                tenant = ?change.service_key.tenant_id,
                owned = change.tpis.len(),
                "partition ownership changed"
            );
        }
        FabricEvent::TopologyChange(change) => {
            tracing::info!(changed_keys = change.changed_keys.len(), "cluster topology changed");
        }
    });

    let partition_service = Arc::new(PartitionService::new(
        partition_config,
        service_info_provider,
        event_publisher,
    ));

    // No real discovery layer in this demo: a solo cluster of one.
    partition_service.recalculate_partitions(&local, &[]);

    let core_partitions = partition_service.get_current_partitions(ServiceType::TbCore);
    tracing::info!(owned = core_partitions.len(), "tb_core partitions owned at startup");

    let topic_registry = Arc::new(TopicRegistry::new());
    let producer = QueueProducer::new(config.requests_topic.clone(), topic_registry.clone());
    let consumer = QueueConsumer::new(config.responses_topic.clone(), topic_registry);
    let request_response = RequestResponseTemplate::new(
        producer,
        consumer,
        RequestResponseConfig {
            max_pending_requests: config.max_pending_requests,
            max_request_timeout: config.max_request_timeout(),
            poll_interval: config.poll_interval(),
        },
    );

    let shutdown = Arc::new(ShutdownController::new());
    shutdown.set_ready();

    let status = serde_json::json!({
        "node_id": config.node_id,
        "state": shutdown.health_state_str(),
        "tb_core_partitions_owned": core_partitions.len(),
    });
    tracing::info!(%status, "fabric demo ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining");
    shutdown.trigger_shutdown();
    request_response.shutdown().await;
    shutdown.wait_for_drain(Duration::from_secs(5)).await;

    tracing::info!("shutdown complete");
    Ok(())
}

//! Lifecycle management for the fabric's long-lived components.
//!
//! Purely an ambient composition aid: nothing in the partition service,
//! event plane, or queue fabric's own contracts depends on this. A caller
//! embedding only the partition service is free to skip the registry
//! entirely and construct it directly.

use std::any::{Any, TypeId};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::config::FabricConfig;

/// Context handed to every service during initialization.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub config: Arc<FabricConfig>,
}

/// Lifecycle-managed service trait. Services are registered with a
/// [`ServiceRegistry`], initialized in registration order, and shut down in
/// reverse registration order.
#[async_trait]
pub trait ManagedService: Send + Sync + Any {
    /// Unique name of this service (e.g. `"partition-service"`).
    fn name(&self) -> &'static str;

    async fn init(&self, ctx: &ServiceContext) -> anyhow::Result<()>;

    async fn shutdown(&self, terminate: bool) -> anyhow::Result<()>;
}

/// Registry for lifecycle-managed services, with both name-based and
/// type-based lookup.
pub struct ServiceRegistry {
    by_name: DashMap<&'static str, Arc<dyn ManagedService>>,
    by_type: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    init_order: RwLock<Vec<&'static str>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            by_type: DashMap::new(),
            init_order: RwLock::new(Vec::new()),
        }
    }

    /// Registers a service. Registration order determines init/shutdown
    /// sequencing.
    pub fn register<T: ManagedService>(&self, service: T) {
        let name = service.name();
        let arc = Arc::new(service);
        self.by_name.insert(name, arc.clone());
        self.by_type.insert(TypeId::of::<T>(), arc);
        self.init_order.write().push(name);
    }

    #[must_use]
    pub fn get<T: ManagedService>(&self) -> Option<Arc<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().clone().downcast::<T>().ok())
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn ManagedService>> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// # Errors
    ///
    /// Returns the first error raised by any service's `init()`.
    pub async fn init_all(&self, ctx: &ServiceContext) -> anyhow::Result<()> {
        let order = self.init_order.read().clone();
        for name in &order {
            if let Some(service) = self.get_by_name(name) {
                service.init(ctx).await?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first error raised by any service's `shutdown()`.
    pub async fn shutdown_all(&self, terminate: bool) -> anyhow::Result<()> {
        let order = self.init_order.read().clone();
        for name in order.iter().rev() {
            if let Some(service) = self.get_by_name(name) {
                service.shutdown(terminate).await?;
            }
        }
        Ok(())
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct TestService {
        svc_name: &'static str,
        init_counter: AtomicU32,
        shutdown_counter: AtomicU32,
        order_log: Arc<parking_lot::Mutex<Vec<String>>>,
    }

    impl TestService {
        fn new(name: &'static str, order_log: Arc<parking_lot::Mutex<Vec<String>>>) -> Self {
            Self {
                svc_name: name,
                init_counter: AtomicU32::new(0),
                shutdown_counter: AtomicU32::new(0),
                order_log,
            }
        }
    }

    #[async_trait]
    impl ManagedService for TestService {
        fn name(&self) -> &'static str {
            self.svc_name
        }

        async fn init(&self, _ctx: &ServiceContext) -> anyhow::Result<()> {
            self.init_counter.fetch_add(1, Ordering::SeqCst);
            self.order_log.lock().push(format!("init:{}", self.svc_name));
            Ok(())
        }

        async fn shutdown(&self, _terminate: bool) -> anyhow::Result<()> {
            self.shutdown_counter.fetch_add(1, Ordering::SeqCst);
            self.order_log.lock().push(format!("shutdown:{}", self.svc_name));
            Ok(())
        }
    }

    struct AnotherService;

    #[async_trait]
    impl ManagedService for AnotherService {
        fn name(&self) -> &'static str {
            "another"
        }
        async fn init(&self, _ctx: &ServiceContext) -> anyhow::Result<()> {
            Ok(())
        }
        async fn shutdown(&self, _terminate: bool) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn make_ctx() -> ServiceContext {
        ServiceContext {
            config: Arc::new(FabricConfig {
                node_id: "test-node".to_string(),
                core_topic: "tb_core".to_string(),
                core_partitions: 100,
                rule_engine_topic: "tb_rule_engine".to_string(),
                rule_engine_partitions: 100,
                hash_function_name: "murmur3_128".to_string(),
                virtual_nodes_size: 16,
                requests_topic: "tb_core.requests".to_string(),
                responses_topic: "tb_core.responses".to_string(),
                max_pending_requests: 10_000,
                max_request_timeout_ms: 10_000,
                poll_interval_ms: 25,
            }),
        }
    }

    #[test]
    fn register_and_get_by_name() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        registry.register(TestService::new("crdt", log));

        let svc = registry.get_by_name("crdt");
        assert!(svc.is_some());
        assert_eq!(svc.unwrap().name(), "crdt");
    }

    #[test]
    fn register_and_get_by_type() {
        let registry = ServiceRegistry::new();
        registry.register(AnotherService);
        let svc = registry.get::<AnotherService>();
        assert!(svc.is_some());
    }

    #[tokio::test]
    async fn init_all_calls_in_registration_order() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let registry = ServiceRegistry::new();
        registry.register(TestService::new("first", log.clone()));
        registry.register(TestService::new("second", log.clone()));
        registry.register(TestService::new("third", log.clone()));

        registry.init_all(&make_ctx()).await.unwrap();

        assert_eq!(log.lock().clone(), vec!["init:first", "init:second", "init:third"]);
    }

    #[tokio::test]
    async fn shutdown_all_calls_in_reverse_order() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let registry = ServiceRegistry::new();
        registry.register(TestService::new("first", log.clone()));
        registry.register(TestService::new("second", log.clone()));
        registry.register(TestService::new("third", log.clone()));

        registry.shutdown_all(false).await.unwrap();

        assert_eq!(
            log.lock().clone(),
            vec!["shutdown:third", "shutdown:second", "shutdown:first"]
        );
    }
}

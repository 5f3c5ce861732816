//! Partition service (C4) -- the crux of the fabric: deterministic
//! entity-to-partition resolution, owner recomputation on membership
//! change, per-tenant isolation tracking, and TPI caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use iot_fabric_core::{
    uuid_msb_lsb, ConsistentHashCircle, HashFunction, ServiceInfo, ServiceKey, ServiceType, TenantId,
    TopicPartitionInfo,
};
use uuid::Uuid;

use crate::events::{ClusterTopologyChangeEvent, EventPublisher, PartitionChangeEvent};
use crate::service_info::ServiceInfoProvider;

/// Startup configuration for the partition service: topic/partition-count
/// per role, hash function, and virtual nodes per instance per ring.
#[derive(Debug, Clone)]
pub struct PartitionServiceConfig {
    pub partition_topics: HashMap<ServiceType, String>,
    pub partition_sizes: HashMap<ServiceType, u32>,
    pub hash_function: HashFunction,
    pub virtual_nodes_size: u32,
}

impl PartitionServiceConfig {
    #[must_use]
    pub fn new(
        roles: impl IntoIterator<Item = (ServiceType, String, u32)>,
        hash_function: HashFunction,
        virtual_nodes_size: u32,
    ) -> Self {
        let mut partition_topics = HashMap::new();
        let mut partition_sizes = HashMap::new();
        for (service_type, topic, partitions) in roles {
            partition_topics.insert(service_type, topic);
            partition_sizes.insert(service_type, partitions);
        }
        Self {
            partition_topics,
            partition_sizes,
            hash_function,
            virtual_nodes_size,
        }
    }
}

/// The wholesale-replaced half of partition state: everything
/// `recalculate_partitions` rebuilds from scratch each call, plus a
/// per-snapshot cache that may still grow between recomputations.
struct PartitionSnapshot {
    my_partitions: HashMap<ServiceKey, Vec<u32>>,
    isolated_tenants: HashMap<TenantId, HashSet<ServiceType>>,
    tpi_cache: DashMap<(ServiceType, Option<TenantId>, u32), TopicPartitionInfo>,
    other_services: Vec<ServiceInfo>,
    initialized: bool,
}

impl PartitionSnapshot {
    fn empty() -> Self {
        Self {
            my_partitions: HashMap::new(),
            isolated_tenants: HashMap::new(),
            tpi_cache: DashMap::new(),
            other_services: Vec::new(),
            initialized: false,
        }
    }
}

/// Entity-to-partition resolution and owner recomputation. Thread-safe for
/// all read paths (`resolve`, `get_current_partitions`, `get_all_service_ids`,
/// `get_notifications_topic`) under concurrent callers; recomputation calls
/// must be serialized by the caller (the discovery layer).
pub struct PartitionService {
    config: PartitionServiceConfig,
    service_info_provider: Arc<dyn ServiceInfoProvider>,
    event_publisher: Arc<EventPublisher>,
    state: ArcSwap<PartitionSnapshot>,
    notification_topics: DashMap<(String, String), TopicPartitionInfo>,
}

impl PartitionService {
    #[must_use]
    pub fn new(
        config: PartitionServiceConfig,
        service_info_provider: Arc<dyn ServiceInfoProvider>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            service_info_provider,
            event_publisher,
            state: ArcSwap::from_pointee(PartitionSnapshot::empty()),
            notification_topics: DashMap::new(),
        }
    }

    /// Deterministic entity -> partition resolution, independent of cluster
    /// membership. See `SPEC_FULL.md` section 4.4.2 for the exact algorithm.
    ///
    /// # Panics
    ///
    /// Panics if `service_type` was not configured with a partition count --
    /// this is a startup wiring error, not a runtime condition callers are
    /// expected to recover from.
    #[must_use]
    pub fn resolve(&self, service_type: ServiceType, tenant_id: TenantId, entity_id: Uuid) -> TopicPartitionInfo {
        let (msb, lsb) = uuid_msb_lsb(&entity_id);
        let h = self
            .config
            .hash_function
            .builder()
            .put_long(msb)
            .put_long(lsb)
            .finish()
            .as_i32();

        let partition_count = *self
            .config
            .partition_sizes
            .get(&service_type)
            .expect("service_type must have a configured partition count");
        let partition = h.unsigned_abs() % partition_count;

        let snapshot = self.state.load();
        let isolated = snapshot
            .isolated_tenants
            .get(&tenant_id)
            .is_some_and(|roles| roles.contains(&service_type));
        let cache_tenant = if isolated { Some(tenant_id) } else { None };
        let cache_key = (service_type, cache_tenant, partition);

        if let Some(tpi) = snapshot.tpi_cache.get(&cache_key) {
            return tpi.clone();
        }

        let owning_key = ServiceKey::new(service_type, cache_tenant.unwrap_or(TenantId::NIL));
        let my_partition = snapshot
            .my_partitions
            .get(&owning_key)
            .is_some_and(|owned| owned.contains(&partition));

        let tpi = self.build_tpi(service_type, cache_tenant, partition, my_partition);
        snapshot.tpi_cache.insert(cache_key, tpi.clone());
        tpi
    }

    /// Recomputes partition ownership from a fresh membership snapshot.
    /// See `SPEC_FULL.md` section 4.4.3 for the exact algorithm. Must not
    /// be called concurrently with itself; the discovery layer is expected
    /// to serialize calls.
    pub fn recalculate_partitions(&self, current: &ServiceInfo, others: &[ServiceInfo]) {
        let old_snapshot = self.state.load();

        let mut circles: HashMap<ServiceKey, ConsistentHashCircle<ServiceInfo>> = HashMap::new();
        let mut new_isolated = old_snapshot.isolated_tenants.clone();

        // Ring population covers local + peers (step 1); isolation registration is
        // peers-only (step 2) -- a local instance dedicated to a tenant isolates
        // that tenant only once some peer also advertises it, never via its own
        // advertisement alone.
        let all_instances: Vec<(&ServiceInfo, bool)> = std::iter::once((current, false))
            .chain(others.iter().map(|peer| (peer, true)))
            .collect();

        for (instance, is_peer) in all_instances.iter().copied() {
            let tenant = instance.tenant_id();
            for role_name in &instance.service_types {
                let Some(service_type) = ServiceType::parse(role_name) else {
                    tracing::warn!(
                        service_id = %instance.service_id,
                        role = %role_name,
                        "unknown role in peer advertisement; skipping"
                    );
                    continue;
                };

                let key = ServiceKey::new(service_type, tenant);
                let circle = circles.entry(key).or_default();
                for i in 0..self.config.virtual_nodes_size {
                    let h = self
                        .config
                        .hash_function
                        .builder()
                        .put_string(&instance.service_id)
                        .put_int(i as i32)
                        .finish()
                        .as_i64();
                    circle.insert(h, instance.clone());
                }

                if is_peer && !tenant.is_nil() {
                    new_isolated.entry(tenant).or_default().insert(service_type);
                }
            }
        }

        let my_tenant = current.tenant_id();
        let mut new_my_partitions: HashMap<ServiceKey, Vec<u32>> = HashMap::new();
        for (&service_type, &partition_count) in &self.config.partition_sizes {
            let ring_key = ServiceKey::new(service_type, my_tenant);
            let Some(circle) = circles.get(&ring_key) else {
                continue;
            };

            let mut owned = Vec::new();
            for i in 0..partition_count {
                if let Some(owner) = circle.resolve_by_partition_idx(self.config.hash_function, i) {
                    if owner.service_id == current.service_id {
                        owned.push(i);
                    }
                }
            }
            if !owned.is_empty() {
                new_my_partitions.insert(ring_key, owned);
            }
        }

        self.emit_partition_change_events(&old_snapshot.my_partitions, &new_my_partitions);

        if old_snapshot.initialized {
            self.emit_topology_change_event(&old_snapshot.other_services, others);
        }

        let new_snapshot = PartitionSnapshot {
            my_partitions: new_my_partitions,
            isolated_tenants: new_isolated,
            tpi_cache: DashMap::new(),
            other_services: others.to_vec(),
            initialized: true,
        };
        self.state.store(Arc::new(new_snapshot));
    }

    fn emit_partition_change_events(
        &self,
        old_my_partitions: &HashMap<ServiceKey, Vec<u32>>,
        new_my_partitions: &HashMap<ServiceKey, Vec<u32>>,
    ) {
        let mut keys: HashSet<ServiceKey> = old_my_partitions.keys().copied().collect();
        keys.extend(new_my_partitions.keys().copied());

        for service_key in keys {
            let old_list = old_my_partitions.get(&service_key);
            let new_list = new_my_partitions.get(&service_key);
            if old_list == new_list {
                continue;
            }

            let tpis = new_list
                .map(|partitions| {
                    let tenant = if service_key.tenant_id.is_nil() {
                        None
                    } else {
                        Some(service_key.tenant_id)
                    };
                    partitions
                        .iter()
                        .map(|&p| self.build_tpi(service_key.service_type, tenant, p, true))
                        .collect()
                })
                .unwrap_or_default();

            self.event_publisher
                .publish_partition_change(PartitionChangeEvent { service_key, tpis });
        }
    }

    fn emit_topology_change_event(&self, old_peers: &[ServiceInfo], new_peers: &[ServiceInfo]) {
        let old_groups = group_peers_by_key(old_peers);
        let new_groups = group_peers_by_key(new_peers);

        let mut changed_keys: Vec<ServiceKey> = Vec::new();
        let mut all_keys: HashSet<ServiceKey> = old_groups.keys().copied().collect();
        all_keys.extend(new_groups.keys().copied());

        for key in all_keys {
            if old_groups.get(&key) != new_groups.get(&key) {
                changed_keys.push(key);
            }
        }

        if !changed_keys.is_empty() {
            self.event_publisher
                .publish_topology_change(ClusterTopologyChangeEvent { changed_keys });
        }
    }

    /// Owned partitions for `service_type`, as TPIs, under the local
    /// instance's own tenant scope. Returns an empty list (never panics)
    /// when the instance currently owns nothing for that role.
    #[must_use]
    pub fn get_current_partitions(&self, service_type: ServiceType) -> Vec<TopicPartitionInfo> {
        let snapshot = self.state.load();
        let my_tenant = self.service_info_provider.get_service_info().tenant_id();
        let key = ServiceKey::new(service_type, my_tenant);

        snapshot
            .my_partitions
            .get(&key)
            .map(|partitions| {
                let tenant = if my_tenant.is_nil() { None } else { Some(my_tenant) };
                partitions
                    .iter()
                    .map(|&p| self.build_tpi(service_type, tenant, p, true))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Union of local and peer service ids declaring `service_type`.
    #[must_use]
    pub fn get_all_service_ids(&self, service_type: ServiceType) -> Vec<String> {
        let snapshot = self.state.load();
        let local = self.service_info_provider.get_service_info();

        let mut ids = Vec::new();
        if local.declares(service_type) {
            ids.push(local.service_id.clone());
        }
        for peer in &snapshot.other_services {
            if peer.declares(service_type) {
                ids.push(peer.service_id.clone());
            }
        }
        ids
    }

    /// Stable notification-channel TPI for `(role_name, service_id)`.
    /// Memoized for CORE and RULE_ENGINE; built fresh every call for any
    /// other role name.
    #[must_use]
    pub fn get_notifications_topic(&self, role_name: &str, service_id: &str) -> TopicPartitionInfo {
        let topic = format!("{}.notifications.{}", role_name.to_lowercase(), service_id);
        let memoized = matches!(
            ServiceType::parse(role_name),
            Some(ServiceType::TbCore) | Some(ServiceType::TbRuleEngine)
        );

        if !memoized {
            return TopicPartitionInfo::notification(topic);
        }

        let cache_key = (role_name.to_string(), service_id.to_string());
        if let Some(tpi) = self.notification_topics.get(&cache_key) {
            return tpi.clone();
        }

        let tpi = TopicPartitionInfo::notification(topic);
        self.notification_topics.insert(cache_key, tpi.clone());
        tpi
    }

    /// Replaces the isolated-tenants map wholesale rather than merging
    /// additively. Exists so a future database-backed source of truth can
    /// prune stale entries; normal recomputation never calls this.
    pub fn replace_isolated_tenants(&self, isolated_tenants: HashMap<TenantId, HashSet<ServiceType>>) {
        let current = self.state.load();
        let replacement = PartitionSnapshot {
            my_partitions: current.my_partitions.clone(),
            isolated_tenants,
            tpi_cache: DashMap::new(),
            other_services: current.other_services.clone(),
            initialized: current.initialized,
        };
        self.state.store(Arc::new(replacement));
    }

    fn build_tpi(
        &self,
        service_type: ServiceType,
        tenant_id: Option<TenantId>,
        partition: u32,
        my_partition: bool,
    ) -> TopicPartitionInfo {
        let topic = self.config.partition_topics[&service_type].clone();
        TopicPartitionInfo::new(topic, partition, tenant_id, my_partition)
    }
}

fn group_peers_by_key(peers: &[ServiceInfo]) -> HashMap<ServiceKey, HashSet<String>> {
    let mut groups: HashMap<ServiceKey, HashSet<String>> = HashMap::new();
    for peer in peers {
        let tenant = peer.tenant_id();
        for service_type in peer.declared_service_types() {
            groups
                .entry(ServiceKey::new(service_type, tenant))
                .or_default()
                .insert(peer.service_id.clone());
        }
    }
    groups
}

//! Service-info provider (C3): supplies the local instance's identity to
//! the partition service. Read-only from the fabric's perspective --
//! production deployments back this with whatever service-discovery
//! mechanism they run; this crate ships a static implementation for single-
//! process demos and tests.

use iot_fabric_core::ServiceInfo;

/// Supplies the local `ServiceInfo`. Implementations must be cheap to call
/// repeatedly -- the partition service reads this on every
/// `get_current_partitions`/`get_all_service_ids` call, not just at
/// recomputation time.
pub trait ServiceInfoProvider: Send + Sync {
    fn get_service_info(&self) -> ServiceInfo;
}

/// A `ServiceInfoProvider` that always returns the same, fixed
/// `ServiceInfo` supplied at construction.
#[derive(Debug, Clone)]
pub struct StaticServiceInfoProvider {
    info: ServiceInfo,
}

impl StaticServiceInfoProvider {
    #[must_use]
    pub fn new(info: ServiceInfo) -> Self {
        Self { info }
    }
}

impl ServiceInfoProvider for StaticServiceInfoProvider {
    fn get_service_info(&self) -> ServiceInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use iot_fabric_core::TenantId;

    use super::*;

    #[test]
    fn static_provider_returns_fixed_info() {
        let info = ServiceInfo::new("node-1", ["TB_CORE".to_string()], TenantId::NIL);
        let provider = StaticServiceInfoProvider::new(info.clone());
        assert_eq!(provider.get_service_info(), info);
    }
}

//! `TopicPartitionInfo`: the immutable addressing value returned by
//! partition resolution.

use serde::{Deserialize, Serialize};

use crate::service_key::TenantId;

/// An immutable, fully-resolved destination: a topic name, a partition
/// index, the tenant it's isolated to (if any), and whether the local
/// instance owned that partition when this value was built.
///
/// `my_partition` can go stale after a rebalance; consumers are expected to
/// rebuild their subscriptions from the event plane rather than poll a TPI
/// for freshness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPartitionInfo {
    pub topic: String,
    pub partition: u32,
    pub tenant_id: Option<TenantId>,
    pub my_partition: bool,
}

impl TopicPartitionInfo {
    #[must_use]
    pub fn new(topic: impl Into<String>, partition: u32, tenant_id: Option<TenantId>, my_partition: bool) -> Self {
        Self {
            topic: topic.into(),
            partition,
            tenant_id,
            my_partition,
        }
    }

    /// Builds a notification-channel TPI: no partition semantics, no
    /// tenant, never owned in the partition sense.
    #[must_use]
    pub fn notification(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            tenant_id: None,
            my_partition: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_tpi_has_no_tenant() {
        let tpi = TopicPartitionInfo::notification("tb_core.notifications.node-1");
        assert_eq!(tpi.tenant_id, None);
        assert!(!tpi.my_partition);
    }
}

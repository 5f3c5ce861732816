//! Service identity: the closed set of roles the fabric partitions for, the
//! tenant scoping those roles can be isolated to, and the `(role, tenant)`
//! key the ring and the partition service index everything by.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed enumeration of roles that participate in partition ownership.
///
/// Peers may advertise other role names (e.g. a transport-only instance);
/// those are recognized by [`ServiceInfo`] but never produce a
/// `ServiceType` and so never participate in a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    TbCore,
    TbRuleEngine,
}

impl ServiceType {
    /// The wire name this role is advertised and configured under.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TbCore => "TB_CORE",
            Self::TbRuleEngine => "TB_RULE_ENGINE",
        }
    }

    /// Parses an advertised role name, returning `None` for anything
    /// outside the closed set. Unrecognized names are not an error here --
    /// the caller logs and skips per the fabric's failure semantics.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "TB_CORE" => Some(Self::TbCore),
            "TB_RULE_ENGINE" => Some(Self::TbRuleEngine),
            _ => None,
        }
    }
}

/// 128-bit tenant identifier. The nil UUID denotes the shared/system scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// The shared scope -- not isolated to any single tenant.
    pub const NIL: TenantId = TenantId(Uuid::nil());

    /// Builds a `TenantId` from its two 64-bit halves (MSB, LSB), matching
    /// the wire representation `ServiceInfo` carries.
    #[must_use]
    pub fn from_parts(msb: i64, lsb: i64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&msb.to_be_bytes());
        bytes[8..16].copy_from_slice(&lsb.to_be_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Splits back into (MSB, LSB) 64-bit halves.
    #[must_use]
    pub fn as_parts(&self) -> (i64, i64) {
        let bytes = self.0.as_bytes();
        let msb = i64::from_be_bytes(bytes[0..8].try_into().expect("8 bytes"));
        let lsb = i64::from_be_bytes(bytes[8..16].try_into().expect("8 bytes"));
        (msb, lsb)
    }

    /// True for the shared/system scope.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Splits a UUID into its two 64-bit halves (MSB, LSB), as used for entity
/// hashing in `resolve`.
#[must_use]
pub fn uuid_msb_lsb(id: &Uuid) -> (i64, i64) {
    let bytes = id.as_bytes();
    let msb = i64::from_be_bytes(bytes[0..8].try_into().expect("8 bytes"));
    let lsb = i64::from_be_bytes(bytes[8..16].try_into().expect("8 bytes"));
    (msb, lsb)
}

/// The unit of partition isolation: every `(role, tenant)` pair owns an
/// independent ring and partition assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub service_type: ServiceType,
    pub tenant_id: TenantId,
}

impl ServiceKey {
    #[must_use]
    pub fn new(service_type: ServiceType, tenant_id: TenantId) -> Self {
        Self {
            service_type,
            tenant_id,
        }
    }
}

/// Immutable identity record for one live service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_id: String,
    pub service_types: HashSet<String>,
    pub tenant_id_msb: i64,
    pub tenant_id_lsb: i64,
}

impl ServiceInfo {
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        service_types: impl IntoIterator<Item = String>,
        tenant_id: TenantId,
    ) -> Self {
        let (msb, lsb) = tenant_id.as_parts();
        Self {
            service_id: service_id.into(),
            service_types: service_types.into_iter().collect(),
            tenant_id_msb: msb,
            tenant_id_lsb: lsb,
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        TenantId::from_parts(self.tenant_id_msb, self.tenant_id_lsb)
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        self.tenant_id().is_nil()
    }

    /// The subset of `service_types` the fabric recognizes as roles that
    /// participate in partition ownership.
    pub fn declared_service_types(&self) -> impl Iterator<Item = ServiceType> + '_ {
        self.service_types.iter().filter_map(|s| ServiceType::parse(s))
    }

    #[must_use]
    pub fn declares(&self, service_type: ServiceType) -> bool {
        self.declared_service_types().any(|t| t == service_type)
    }
}

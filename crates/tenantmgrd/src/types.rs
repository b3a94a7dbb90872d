//! Tenant service snapshot

use serde::{Deserialize, Serialize};

use netfabric_common::{FabricError, FabricResult};
use netfabric_types::{FabricTopology, Tenant};

/// A tenant together with the fabric it lives on.
///
/// The intent store hands both out as read-only snapshots; the tenant refers
/// to its fabric by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TenantSnapshot {
    pub tenant: Tenant,
    pub fabric: FabricTopology,
}

impl TenantSnapshot {
    pub fn new(tenant: Tenant, fabric: FabricTopology) -> Self {
        Self { tenant, fabric }
    }

    /// Checks that the fabric is the one the tenant names and that it is
    /// structurally valid.
    pub fn validate(&self) -> FabricResult<()> {
        if self.tenant.fabric != self.fabric.name {
            return Err(FabricError::configuration(format!(
                "tenant {} belongs to network-fabric {}, not {}",
                self.tenant.name, self.tenant.fabric, self.fabric.name
            )));
        }
        self.fabric.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fabric_mismatch() {
        let snapshot = TenantSnapshot::new(Tenant::new("acme", "dc2"), FabricTopology::new("dc1"));
        let err = snapshot.validate().unwrap_err();
        assert!(matches!(err, FabricError::Configuration { .. }));

        let snapshot = TenantSnapshot::new(Tenant::new("acme", "dc1"), FabricTopology::new("dc1"));
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "tenant": {"name": "acme", "fabric": "dc1", "layer3": {"enabled": true, "vrf": ["prod"]}},
            "fabric": {"name": "dc1"}
        }"#;
        let snapshot: TenantSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.tenant.vrf_device_names(), vec!["acme_prod".to_string()]);
        assert!(snapshot.fabric.switch_pairs.is_empty());
    }
}

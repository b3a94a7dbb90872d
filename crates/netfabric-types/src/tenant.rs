//! Tenant intent model.

use serde::{Deserialize, Serialize};

/// A tenant: a layer-3 isolation domain instantiated on a fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Tenant {
    pub name: String,
    /// Name of the fabric the tenant is built on.
    pub fabric: String,
    #[serde(default)]
    pub layer3: TenantLayer3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TenantLayer3 {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "vrf")]
    pub vrfs: Vec<String>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, fabric: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fabric: fabric.into(),
            layer3: TenantLayer3::default(),
        }
    }

    /// Name of a tenant VRF as configured on the devices: `<tenant>_<vrf>`.
    pub fn vrf_device_name(&self, vrf: &str) -> String {
        format!("{}_{}", self.name, vrf)
    }

    /// Device VRF names of every VRF of the tenant, in model order.
    pub fn vrf_device_names(&self) -> Vec<String> {
        self.layer3
            .vrfs
            .iter()
            .map(|vrf| self.vrf_device_name(vrf))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vrf_device_names() {
        let mut tenant = Tenant::new("acme", "dc1");
        tenant.layer3.enabled = true;
        tenant.layer3.vrfs = vec!["prod".to_string(), "dev".to_string()];
        assert_eq!(tenant.vrf_device_names(), vec!["acme_prod", "acme_dev"]);
    }

    #[test]
    fn test_deserialize_without_layer3() {
        let tenant: Tenant = serde_json::from_str(r#"{"name": "acme", "fabric": "dc1"}"#).unwrap();
        assert!(!tenant.layer3.enabled);
        assert!(tenant.vrf_device_names().is_empty());
    }
}

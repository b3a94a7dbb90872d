//! Engine configuration file.
//!
//! Loads and validates planning and verification settings from TOML.
//! Default location: /etc/netfabric/netfabric.conf

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FabricError, FabricResult};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netfabric/netfabric.conf";

/// Spanning-tree priority step; priorities must be multiples of it.
pub const STP_PRIORITY_STEP: u32 = 4096;

/// Highest configurable spanning-tree priority.
pub const STP_PRIORITY_MAX: u32 = 61440;

/// Plan builder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Spanning-tree priority applied to the root bridge
    #[serde(default = "default_root_bridge_priority")]
    pub root_bridge_priority: u32,

    /// MTU applied to fabric trunk port-channels
    #[serde(default = "default_fabric_trunk_mtu")]
    pub fabric_trunk_mtu: String,

    /// First id of the VPC domain id pool
    #[serde(default = "default_vpc_domain_id_min")]
    pub vpc_domain_id_min: u32,

    /// Last id of the VPC domain id pool
    #[serde(default = "default_vpc_domain_id_max")]
    pub vpc_domain_id_max: u32,

    /// VLANs allowed on fabric trunks and the peer-link
    #[serde(default = "default_trunk_vlans")]
    pub trunk_vlans: String,
}

/// Verification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Wall-clock budget of a full test pass in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Spanning-tree protocol every switch must run
    #[serde(default = "default_required_stp_protocol")]
    pub required_stp_protocol: String,

    /// Features that must be enabled on a tenant's layer-3 switches
    #[serde(default = "default_layer3_features")]
    pub layer3_features: Vec<String>,
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub verification: VerificationConfig,
}

// Default functions
fn default_root_bridge_priority() -> u32 {
    STP_PRIORITY_STEP
}

fn default_fabric_trunk_mtu() -> String {
    "9216".to_string()
}

fn default_vpc_domain_id_min() -> u32 {
    1
}

fn default_vpc_domain_id_max() -> u32 {
    1000
}

fn default_trunk_vlans() -> String {
    "all".to_string()
}

fn default_timeout_secs() -> u64 {
    360
}

fn default_required_stp_protocol() -> String {
    "rapid_pvst".to_string()
}

fn default_layer3_features() -> Vec<String> {
    ["hsrp_engine", "interface-vlan", "ospf"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            root_bridge_priority: default_root_bridge_priority(),
            fabric_trunk_mtu: default_fabric_trunk_mtu(),
            vpc_domain_id_min: default_vpc_domain_id_min(),
            vpc_domain_id_max: default_vpc_domain_id_max(),
            trunk_vlans: default_trunk_vlans(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            required_stp_protocol: default_required_stp_protocol(),
            layer3_features: default_layer3_features(),
        }
    }
}

impl PlanConfig {
    /// Range of the VPC domain id pool
    pub fn vpc_domain_id_range(&self) -> RangeInclusive<u32> {
        self.vpc_domain_id_min..=self.vpc_domain_id_max
    }
}

impl VerificationConfig {
    /// Get the pass budget as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EngineConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> FabricResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| FabricError::ConfigFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(FabricError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> FabricResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> FabricResult<()> {
        let priority = self.plan.root_bridge_priority;
        if priority % STP_PRIORITY_STEP != 0 || priority > STP_PRIORITY_MAX {
            return Err(FabricError::configuration(format!(
                "root_bridge_priority must be a multiple of {} up to {}, got {}",
                STP_PRIORITY_STEP, STP_PRIORITY_MAX, priority
            )));
        }

        if self.plan.vpc_domain_id_min == 0
            || self.plan.vpc_domain_id_min > self.plan.vpc_domain_id_max
        {
            return Err(FabricError::configuration(format!(
                "vpc domain id range {}..={} is empty",
                self.plan.vpc_domain_id_min, self.plan.vpc_domain_id_max
            )));
        }

        if self.verification.timeout_secs == 0 {
            return Err(FabricError::configuration("timeout_secs must be > 0"));
        }

        if self.verification.required_stp_protocol.is_empty() {
            return Err(FabricError::configuration(
                "required_stp_protocol must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.plan.root_bridge_priority, 4096);
        assert_eq!(config.plan.fabric_trunk_mtu, "9216");
        assert_eq!(config.plan.vpc_domain_id_range(), 1..=1000);
        assert_eq!(config.verification.timeout(), Duration::from_secs(360));
        assert_eq!(
            config.verification.layer3_features,
            vec!["hsrp_engine", "interface-vlan", "ospf"]
        );
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_priority() {
        let mut config = EngineConfig::default();
        config.plan.root_bridge_priority = 5000;
        assert!(config.validate().is_err());

        config.plan.root_bridge_priority = 65536;
        assert!(config.validate().is_err());

        config.plan.root_bridge_priority = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_id_range() {
        let mut config = EngineConfig::default();
        config.plan.vpc_domain_id_min = 500;
        config.plan.vpc_domain_id_max = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_timeout_and_protocol() {
        let mut config = EngineConfig::default();
        config.verification.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.verification.required_stp_protocol.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[plan]
root_bridge_priority = 8192

[verification]
timeout_secs = 60
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.plan.root_bridge_priority, 8192);
        assert_eq!(config.verification.timeout_secs, 60);
        // Unspecified values should use defaults
        assert_eq!(config.plan.trunk_vlans, "all");
        assert_eq!(config.verification.required_stp_protocol, "rapid_pvst");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[plan]\nfabric_trunk_mtu = \"9000\"").unwrap();
        let config = EngineConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.plan.fabric_trunk_mtu, "9000");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[plan\nbroken").unwrap();
        let err = EngineConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, FabricError::ConfigFile { .. }));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[verification]\ntimeout_secs = 0").unwrap();
        assert!(EngineConfig::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = EngineConfig::load_or_default("/nonexistent/netfabric.conf").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}

//! Fabric intent model.
//!
//! A fabric is shallow and enumerable: fabric -> switch-pairs / switches ->
//! fabric trunks -> member interfaces. Snapshots are built fresh from the
//! network model for every reconciliation or verification pass and are never
//! mutated; derived facts (resolved root, layer-3 pair) are computed on demand.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::interface::MemberInterfaces;
use crate::ip::ManagementAddress;
use crate::platform::Platform;
use crate::ModelError;

/// Spanning-tree root choice of a fabric. At most one option can be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanningTreeRoot {
    /// A switch-pair, referenced by name.
    SwitchPair(String),
    /// A standalone switch, referenced by device name.
    Switch(String),
    #[default]
    Unset,
}

/// A network fabric service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FabricTopology {
    pub name: String,
    #[serde(default, rename = "switch-pair")]
    pub switch_pairs: Vec<SwitchPair>,
    #[serde(default, rename = "switch")]
    pub switches: Vec<Switch>,
    #[serde(default)]
    pub spanning_tree_root: SpanningTreeRoot,
    #[serde(default, rename = "fabric-interconnect")]
    pub fabric_interconnects: Vec<FabricInterconnect>,
    #[serde(default, rename = "vcenter")]
    pub vcenters: Vec<VCenter>,
}

/// Two switches configured as one multiswitch (VPC) unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchPair {
    pub name: String,
    #[serde(rename = "switch")]
    pub switches: Vec<Switch>,
    #[serde(default)]
    pub layer3: bool,
    pub multiswitch_peerlink: MultiswitchPeerlink,
    #[serde(default, rename = "fabric-trunk")]
    pub fabric_trunks: Vec<PortChannel>,
}

/// Peer-link of a switch-pair: exactly one port-channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MultiswitchPeerlink {
    pub port_channel: PortChannel,
}

/// A switch in the fabric, either a pair member or standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Switch {
    /// Device name in the device inventory.
    pub device: String,
    pub platform: Platform,
    #[serde(default)]
    pub mgmt_address: Option<ManagementAddress>,
    /// Trunks owned directly by a standalone switch. Pair members leave this
    /// empty; the pair owns its trunks.
    #[serde(default, rename = "fabric-trunk")]
    pub fabric_trunks: Vec<PortChannel>,
}

/// A fabric trunk (or peer-link) port-channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortChannel {
    /// Port-channel id, e.g. `"10"` for `Port-channel10`.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub member_interface: MemberInterfaces,
}

/// Fabric interconnect attached to the fabric. Carries no fabric-level
/// configuration; segments configure it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricInterconnect {
    pub device: String,
}

/// Virtualization manager attached to the fabric. Carries no fabric-level
/// configuration; segments configure it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VCenter {
    pub device: String,
}

impl FabricTopology {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            switch_pairs: Vec::new(),
            switches: Vec::new(),
            spanning_tree_root: SpanningTreeRoot::Unset,
            fabric_interconnects: Vec::new(),
            vcenters: Vec::new(),
        }
    }

    pub fn switch_pair(&self, name: &str) -> Option<&SwitchPair> {
        self.switch_pairs.iter().find(|pair| pair.name == name)
    }

    pub fn switch(&self, device: &str) -> Option<&Switch> {
        self.switches.iter().find(|switch| switch.device == device)
    }

    /// Iterates over every switch: pair members first, then standalone switches.
    pub fn all_switches(&self) -> impl Iterator<Item = &Switch> {
        self.switch_pairs
            .iter()
            .flat_map(|pair| pair.switches.iter())
            .chain(self.switches.iter())
    }

    /// Device names of every switch, in [`all_switches`](Self::all_switches) order.
    pub fn devices(&self) -> Vec<String> {
        self.all_switches().map(|s| s.device.clone()).collect()
    }

    /// Checks the structural invariants of the snapshot.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.is_empty() {
            return Err(ModelError::new("network-fabric", "name must not be empty"));
        }

        let mut pair_names = HashSet::new();
        let mut devices = HashSet::new();
        let mut layer3_pairs = Vec::new();

        for pair in &self.switch_pairs {
            let field = format!("switch-pair[{}]", pair.name);
            if !pair_names.insert(pair.name.as_str()) {
                return Err(ModelError::new(field, "duplicate switch-pair name"));
            }
            if pair.switches.len() != 2 {
                return Err(ModelError::new(
                    field,
                    format!("must have exactly 2 switches, found {}", pair.switches.len()),
                ));
            }
            for switch in &pair.switches {
                if !devices.insert(switch.device.as_str()) {
                    return Err(ModelError::new(
                        field,
                        format!("device {} is used more than once in the fabric", switch.device),
                    ));
                }
            }
            if pair.layer3 {
                layer3_pairs.push(pair.name.as_str());
            }

            let mut trunk_names = HashSet::new();
            trunk_names.insert(pair.peerlink().name.as_str());
            for trunk in &pair.fabric_trunks {
                if !trunk_names.insert(trunk.name.as_str()) {
                    return Err(ModelError::new(
                        field,
                        format!("port-channel {} is declared more than once", trunk.name),
                    ));
                }
            }
        }

        for switch in &self.switches {
            let field = format!("switch[{}]", switch.device);
            if !devices.insert(switch.device.as_str()) {
                return Err(ModelError::new(field, "device is used more than once in the fabric"));
            }
            let mut trunk_names = HashSet::new();
            for trunk in &switch.fabric_trunks {
                if !trunk_names.insert(trunk.name.as_str()) {
                    return Err(ModelError::new(
                        field,
                        format!("port-channel {} is declared more than once", trunk.name),
                    ));
                }
            }
        }

        if layer3_pairs.len() > 1 {
            return Err(ModelError::new(
                "switch-pair/layer3",
                format!(
                    "only one layer3 switch-pair is allowed, found [{}]",
                    layer3_pairs.join(", ")
                ),
            ));
        }

        match &self.spanning_tree_root {
            SpanningTreeRoot::SwitchPair(name) if self.switch_pair(name).is_none() => {
                Err(ModelError::new(
                    "spanning-tree-root/switch-pair",
                    format!("switch-pair {} does not exist in fabric {}", name, self.name),
                ))
            }
            SpanningTreeRoot::Switch(device) if self.switch(device).is_none() => {
                Err(ModelError::new(
                    "spanning-tree-root/switch",
                    format!("switch {} does not exist in fabric {}", device, self.name),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl SwitchPair {
    /// Returns the two members as (primary, secondary).
    pub fn members(&self) -> Option<(&Switch, &Switch)> {
        match self.switches.as_slice() {
            [primary, secondary] => Some((primary, secondary)),
            _ => None,
        }
    }

    pub fn contains_device(&self, device: &str) -> bool {
        self.switches.iter().any(|s| s.device == device)
    }

    pub fn peerlink(&self) -> &PortChannel {
        &self.multiswitch_peerlink.port_channel
    }
}

impl Switch {
    pub fn new(device: impl Into<String>, platform: Platform) -> Self {
        Self {
            device: device.into(),
            platform,
            mgmt_address: None,
            fabric_trunks: Vec::new(),
        }
    }
}

impl PortChannel {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        member_interface: MemberInterfaces,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            member_interface,
        }
    }

    /// Interface name as shown in operational output, e.g. `Port-channel10`.
    pub fn interface_name(&self) -> String {
        format!("Port-channel{}", self.name)
    }
}

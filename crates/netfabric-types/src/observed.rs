//! Observed device state.
//!
//! Structured records produced by the device-access layer from operational
//! command output. Field names follow the parser output (snake_case). Every
//! table is optional: a table that is absent means the state was not
//! discovered, which is a different outcome from a table reporting "down".

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::interface::canonical_interface_name;
use crate::vlan::VlanId;

/// Operating system identifier reported for Nexus switches.
pub const OS_NXOS: &str = "nxos";

/// Spanning-tree protocol key of rapid per-VLAN spanning tree.
pub const RAPID_PVST: &str = "rapid_pvst";

/// Keepalive status of a healthy VPC peer.
pub const VPC_KEEPALIVE_ALIVE: &str = "peer is alive";

/// Peer status of a VPC domain with a formed adjacency.
pub const VPC_PEER_ADJACENCY_OK: &str = "peer adjacency formed ok";

/// Port state of an operational VPC.
pub const VPC_PORT_STATE_UP: &str = "up";

/// Port-channel member flag of a bundled interface.
pub const MEMBER_FLAG_BUNDLED: &str = "P";

/// Primary feature instance id.
pub const FEATURE_PRIMARY_INSTANCE: &str = "1";

/// Operational snapshot of a single device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedDeviceState {
    pub device: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub spanning_tree: Option<SpanningTreeTable>,
    #[serde(default)]
    pub vpc: Option<VpcTable>,
    #[serde(default)]
    pub port_channels: Option<PortChannelTable>,
    #[serde(default)]
    pub features: Option<FeatureTable>,
    #[serde(default)]
    pub vrfs: Option<BTreeSet<String>>,
    #[serde(default)]
    pub ospf: Option<OspfTable>,
}

impl ObservedDeviceState {
    pub fn new(device: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            os: os.into(),
            ..Default::default()
        }
    }

    pub fn is_nxos(&self) -> bool {
        self.os == OS_NXOS
    }
}

/// Spanning-tree protocol name (e.g. `rapid_pvst`, `mstp`) to its per-VLAN state.
pub type SpanningTreeTable = BTreeMap<String, SpanningTreeProtocol>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanningTreeProtocol {
    #[serde(default)]
    pub vlans: BTreeMap<VlanId, SpanningTreeVlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanningTreeVlan {
    /// Set by the parser only when the device reports itself as root.
    #[serde(default)]
    pub root_of_the_spanning_tree: Option<bool>,
}

impl SpanningTreeVlan {
    pub fn root(is_root: bool) -> Self {
        Self {
            root_of_the_spanning_tree: Some(is_root),
        }
    }

    /// An absent flag counts as not root.
    pub fn is_root(&self) -> bool {
        self.root_of_the_spanning_tree.unwrap_or(false)
    }
}

/// VPC domain state of one switch-pair member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcTable {
    #[serde(default)]
    pub vpc_peer_keepalive_status: Option<String>,
    #[serde(default)]
    pub vpc_peer_status: Option<String>,
    /// Peer-link entries keyed by peer-link id.
    #[serde(default)]
    pub peer_link: Option<BTreeMap<String, VpcPeerLink>>,
    #[serde(default)]
    pub num_of_vpcs: Option<u32>,
    #[serde(default)]
    pub vpc: BTreeMap<String, VpcEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcPeerLink {
    pub peer_link_id: String,
    #[serde(default)]
    pub peer_link_ifindex: String,
    #[serde(default)]
    pub peer_link_port_state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcEntry {
    /// Port-channel interface carrying the VPC, e.g. `Po10`.
    pub vpc_ifindex: String,
    pub vpc_port_state: String,
}

/// Port-channel summary of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortChannelTable {
    /// Keyed by port-channel interface name, e.g. `Port-channel10`.
    #[serde(default)]
    pub interfaces: BTreeMap<String, PortChannelEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortChannelEntry {
    pub bundle_id: u32,
    /// Member interface name to its state.
    #[serde(default)]
    pub members: BTreeMap<String, PortChannelMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortChannelMember {
    pub flags: String,
}

impl PortChannelMember {
    pub fn new(flags: impl Into<String>) -> Self {
        Self {
            flags: flags.into(),
        }
    }

    pub fn is_bundled(&self) -> bool {
        self.flags == MEMBER_FLAG_BUNDLED
    }
}

impl PortChannelTable {
    /// Bundle ids of every observed port-channel, as strings.
    pub fn bundle_ids(&self) -> BTreeSet<String> {
        self.interfaces
            .values()
            .map(|entry| entry.bundle_id.to_string())
            .collect()
    }

    /// Looks up a port-channel by its id (`"10"` matches `Port-channel10`).
    pub fn by_id(&self, id: &str) -> Option<&PortChannelEntry> {
        self.interfaces.get(&format!("Port-channel{}", id)).or_else(|| {
            self.interfaces
                .values()
                .find(|entry| entry.bundle_id.to_string() == id)
        })
    }
}

impl PortChannelEntry {
    /// Member names expanded to their canonical full form.
    pub fn canonical_members(&self) -> BTreeSet<String> {
        self.members
            .keys()
            .map(|name| canonical_interface_name(name))
            .collect()
    }
}

/// Feature name to its instances.
pub type FeatureTable = BTreeMap<String, Feature>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub instance: BTreeMap<String, FeatureInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureInstance {
    pub state: String,
}

impl Feature {
    pub fn with_state(state: impl Into<String>) -> Self {
        let mut instance = BTreeMap::new();
        instance.insert(
            FEATURE_PRIMARY_INSTANCE.to_string(),
            FeatureInstance {
                state: state.into(),
            },
        );
        Self { instance }
    }

    /// State of the primary instance, if reported.
    pub fn primary_state(&self) -> Option<&str> {
        self.instance
            .get(FEATURE_PRIMARY_INSTANCE)
            .map(|instance| instance.state.as_str())
    }
}

/// OSPF state of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfTable {
    #[serde(default)]
    pub feature_ospf: bool,
    /// VRFs with an OSPF instance.
    #[serde(default)]
    pub vrfs: BTreeSet<String>,
}

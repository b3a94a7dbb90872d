//! Test fixtures for common fabric patterns
//!
//! Provides reusable intent snapshots and observed device state. Observed
//! state derived from a fabric is healthy: every test of the battery passes
//! against it until a test breaks it on purpose.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use netfabric_common::resolver::{is_root_bridge, resolve_layer3_pair, resolve_spanning_tree_root};
use netfabric_tenantmgrd::TenantSnapshot;
use netfabric_types::{
    Feature, FabricTopology, ObservedDeviceState, OspfTable, PortChannel, PortChannelEntry,
    PortChannelMember, PortChannelTable, SpanningTreeProtocol, SpanningTreeTable,
    SpanningTreeVlan, VlanId, VpcEntry, VpcPeerLink, VpcTable, MEMBER_FLAG_BUNDLED, OS_NXOS,
    RAPID_PVST, VPC_KEEPALIVE_ALIVE, VPC_PEER_ADJACENCY_OK, VPC_PORT_STATE_UP,
};

/// Common fabric topology fixtures
pub mod topology_fixtures {
    use netfabric_types::{
        FabricTopology, InterfaceType, ManagementAddress, MemberInterfaces, MultiswitchPeerlink,
        Platform, PortChannel, Switch, SwitchPair,
    };

    /// Name of the fabric every fixture lives on
    pub const FABRIC: &str = "dc1";

    /// Name of the switch-pair of [`two_switch_fabric`]
    pub const PAIR: &str = "core";

    /// Nexus 9000 running NX-OS 9.3
    pub fn nxos_platform() -> Platform {
        Platform::new("NX-OS", "N9K", "9.3(8)")
    }

    /// Catalyst 9300 running IOS-XE 16.12
    pub fn catalyst_platform() -> Platform {
        Platform::new("ios", "9300", "16.12.4")
    }

    /// Switch with a /24 management address
    pub fn switch(device: &str, platform: Platform, mgmt: [u8; 4]) -> Switch {
        let mut switch = Switch::new(device, platform);
        switch.mgmt_address = ManagementAddress::new(mgmt.into(), Some(24)).ok();
        switch
    }

    /// Port-channel over the given member interfaces
    pub fn port_channel(name: &str, kind: InterfaceType, ids: &[&str]) -> PortChannel {
        PortChannel::new(
            name,
            format!("fabric trunk {}", name),
            MemberInterfaces::new(kind, ids.iter().copied()),
        )
    }

    /// Fabric trunks `10`, `20`, ... with two members each
    pub fn fabric_trunks(count: usize, kind: InterfaceType) -> Vec<PortChannel> {
        (1..=count)
            .map(|n| {
                let first = format!("1/0/{}", 2 * n - 1);
                let second = format!("1/0/{}", 2 * n);
                port_channel(&(n * 10).to_string(), kind, &[first.as_str(), second.as_str()])
            })
            .collect()
    }

    /// Switch-pair `core` of `sw1`/`sw2` with peer-link `1`
    pub fn switch_pair(platform: Platform, layer3: bool, trunks: Vec<PortChannel>) -> SwitchPair {
        let kind = trunks
            .first()
            .map_or(InterfaceType::Ethernet, |t| t.member_interface.interface_type());
        SwitchPair {
            name: PAIR.to_string(),
            switches: vec![
                switch("sw1", platform.clone(), [10, 0, 0, 1]),
                switch("sw2", platform, [10, 0, 0, 2]),
            ],
            layer3,
            multiswitch_peerlink: MultiswitchPeerlink {
                port_channel: PortChannel::new(
                    "1",
                    "",
                    MemberInterfaces::new(kind, ["1/0/47", "1/0/48"]),
                ),
            },
            fabric_trunks: trunks,
        }
    }

    /// One switch-pair, no standalone switches, root unset
    pub fn two_switch_fabric(platform: Platform, layer3: bool, trunks: usize) -> FabricTopology {
        let kind = if platform.is_nxos() {
            InterfaceType::Ethernet
        } else {
            InterfaceType::TenGigabitEthernet
        };
        let mut fabric = FabricTopology::new(FABRIC);
        fabric
            .switch_pairs
            .push(switch_pair(platform, layer3, fabric_trunks(trunks, kind)));
        fabric
    }

    /// A layer-3 NX-OS pair plus a standalone access switch `access1`
    /// with one trunk of its own.
    pub fn pair_and_access_fabric() -> FabricTopology {
        let mut fabric = two_switch_fabric(nxos_platform(), true, 2);
        let mut access = switch("access1", catalyst_platform(), [10, 0, 0, 11]);
        access.fabric_trunks = vec![port_channel(
            "30",
            InterfaceType::TenGigabitEthernet,
            &["1/1/1", "1/1/2"],
        )];
        fabric.switches.push(access);
        fabric
    }
}

/// Common tenant fixtures
pub mod tenant_fixtures {
    use netfabric_tenantmgrd::TenantSnapshot;
    use netfabric_types::{FabricTopology, Tenant};

    /// Tenant `acme` on `fabric` with layer 3 enabled
    pub fn layer3_tenant(fabric: &FabricTopology, vrfs: &[&str]) -> TenantSnapshot {
        let mut tenant = Tenant::new("acme", fabric.name.as_str());
        tenant.layer3.enabled = true;
        tenant.layer3.vrfs = vrfs.iter().map(|v| v.to_string()).collect();
        TenantSnapshot::new(tenant, fabric.clone())
    }
}

/// Builder of one device's observed state. Every table starts out absent.
#[derive(Debug, Clone)]
pub struct ObservedStateBuilder {
    state: ObservedDeviceState,
}

impl ObservedStateBuilder {
    /// NX-OS device with nothing discovered
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            state: ObservedDeviceState::new(device, OS_NXOS),
        }
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.state.os = os.into();
        self
    }

    /// Adds a spanning-tree protocol running on `vlans`, each with the same
    /// root flag.
    pub fn spanning_tree(mut self, protocol: &str, vlans: &[u16], root: bool) -> Self {
        let mut state = SpanningTreeProtocol::default();
        for vlan in vlans.iter().filter_map(|v| VlanId::new(*v).ok()) {
            state.vlans.insert(vlan, SpanningTreeVlan::root(root));
        }
        self.state
            .spanning_tree
            .get_or_insert_with(SpanningTreeTable::new)
            .insert(protocol.to_string(), state);
        self
    }

    /// Adds `Port-channel<id>` with every member carrying `flags`.
    pub fn port_channel<S: AsRef<str>>(mut self, id: &str, members: &[S], flags: &str) -> Self {
        let entry = PortChannelEntry {
            bundle_id: id.parse().unwrap_or_default(),
            members: members
                .iter()
                .map(|m| (m.as_ref().to_string(), PortChannelMember::new(flags)))
                .collect(),
        };
        self.state
            .port_channels
            .get_or_insert_with(PortChannelTable::default)
            .interfaces
            .insert(format!("Port-channel{}", id), entry);
        self
    }

    /// Reports a port-channel summary, empty until port-channels are added.
    pub fn port_channels_discovered(mut self) -> Self {
        self.state.port_channels.get_or_insert_with(PortChannelTable::default);
        self
    }

    /// Adds a configured port-channel with all members bundled.
    pub fn bundled(self, trunk: &PortChannel) -> Self {
        let members = trunk.member_interface.interface_names();
        self.port_channel(&trunk.name, members.as_slice(), MEMBER_FLAG_BUNDLED)
    }

    /// Healthy VPC domain: peer alive, adjacency formed, every VPC up.
    pub fn vpc_healthy<S: AsRef<str>>(mut self, peer_link_id: &str, vpcs: &[S]) -> Self {
        let mut peer_link = BTreeMap::new();
        peer_link.insert(
            peer_link_id.to_string(),
            VpcPeerLink {
                peer_link_id: peer_link_id.to_string(),
                peer_link_ifindex: format!("Po{}", peer_link_id),
                peer_link_port_state: VPC_PORT_STATE_UP.to_string(),
            },
        );
        let vpc = vpcs
            .iter()
            .map(|id| {
                let id = id.as_ref();
                (
                    id.to_string(),
                    VpcEntry {
                        vpc_ifindex: format!("Po{}", id),
                        vpc_port_state: VPC_PORT_STATE_UP.to_string(),
                    },
                )
            })
            .collect();
        self.state.vpc = Some(VpcTable {
            vpc_peer_keepalive_status: Some(VPC_KEEPALIVE_ALIVE.to_string()),
            vpc_peer_status: Some(VPC_PEER_ADJACENCY_OK.to_string()),
            peer_link: Some(peer_link),
            num_of_vpcs: u32::try_from(vpcs.len()).ok(),
            vpc,
        });
        self
    }

    pub fn vpc(mut self, table: VpcTable) -> Self {
        self.state.vpc = Some(table);
        self
    }

    /// Adds features with the given primary instance state.
    pub fn features(mut self, features: &[(&str, &str)]) -> Self {
        let table = self.state.features.get_or_insert_with(BTreeMap::new);
        for (name, state) in features {
            table.insert(name.to_string(), Feature::with_state(*state));
        }
        self
    }

    pub fn vrfs<S: AsRef<str>>(mut self, vrfs: &[S]) -> Self {
        self.state.vrfs = Some(vrfs.iter().map(|v| v.as_ref().to_string()).collect());
        self
    }

    /// OSPF enabled with an instance in each of `vrfs`.
    pub fn ospf<S: AsRef<str>>(mut self, vrfs: &[S]) -> Self {
        self.state.ospf = Some(OspfTable {
            feature_ospf: true,
            vrfs: vrfs.iter().map(|v| v.as_ref().to_string()).collect(),
        });
        self
    }

    /// OSPF reported but not running.
    pub fn ospf_stopped(mut self) -> Self {
        self.state.ospf = Some(OspfTable::default());
        self
    }

    pub fn build(self) -> ObservedDeviceState {
        self.state
    }
}

/// Observed state of every switch of `fabric` that passes the fabric test
/// battery: rapid-PVST on VLAN 1 with the root flag where the resolved root
/// says, every configured port-channel bundled, and healthy VPC domains.
pub fn healthy_fabric_state(fabric: &FabricTopology) -> Vec<ObservedDeviceState> {
    let root = resolve_spanning_tree_root(fabric);
    let mut states = Vec::new();

    for pair in &fabric.switch_pairs {
        let vpcs: Vec<&str> = pair.fabric_trunks.iter().map(|t| t.name.as_str()).collect();
        for switch in &pair.switches {
            let builder = ObservedStateBuilder::new(switch.device.as_str())
                .spanning_tree(RAPID_PVST, &[1], is_root_bridge(&switch.device, &root))
                .bundled(pair.peerlink())
                .vpc_healthy(&pair.peerlink().name, vpcs.as_slice());
            states.push(
                pair.fabric_trunks
                    .iter()
                    .fold(builder, |b, trunk| b.bundled(trunk))
                    .build(),
            );
        }
    }

    for switch in &fabric.switches {
        let builder = ObservedStateBuilder::new(switch.device.as_str())
            .spanning_tree(RAPID_PVST, &[1], is_root_bridge(&switch.device, &root))
            .port_channels_discovered();
        states.push(
            switch
                .fabric_trunks
                .iter()
                .fold(builder, |b, trunk| b.bundled(trunk))
                .build(),
        );
    }

    debug!(fabric = %fabric.name, devices = states.len(), "healthy fabric state built");
    states
}

/// Observed state of the tenant's layer-3 pair that passes the tenant test
/// battery with `features` enabled.
pub fn healthy_tenant_state(snapshot: &TenantSnapshot, features: &[String]) -> Vec<ObservedDeviceState> {
    let Some(pair) = resolve_layer3_pair(&snapshot.fabric) else {
        return Vec::new();
    };
    let vrfs = snapshot.tenant.vrf_device_names();
    let enabled: Vec<(&str, &str)> = features.iter().map(|f| (f.as_str(), "enabled")).collect();

    pair.switches
        .iter()
        .map(|switch| {
            ObservedStateBuilder::new(switch.device.as_str())
                .features(&enabled)
                .vrfs(vrfs.as_slice())
                .ospf(vrfs.as_slice())
                .build()
        })
        .collect()
}

/// Replaces the state of `device` in `states`.
pub fn replace_state(states: &mut [ObservedDeviceState], state: ObservedDeviceState) {
    if let Some(slot) = states.iter_mut().find(|s| s.device == state.device) {
        *slot = state;
    }
}

/// Ids of every port-channel a device reports.
pub fn observed_bundle_ids(state: &ObservedDeviceState) -> BTreeSet<String> {
    state
        .port_channels
        .as_ref()
        .map(PortChannelTable::bundle_ids)
        .unwrap_or_default()
}

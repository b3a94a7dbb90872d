//! Common types for network fabric orchestration.
//!
//! This crate provides the intent model consumed by the fabric and tenant
//! service managers, and the observed-state records produced by device
//! command parsing:
//!
//! - [`FabricTopology`]: switch-pairs, standalone switches and the spanning-tree root choice
//! - [`Tenant`]: layer-3 isolation domains built on a fabric's layer-3 pair
//! - [`Platform`]: device platform descriptor with a parsed [`PlatformVersion`]
//! - [`MemberInterfaces`]: port-channel member selection, one [`InterfaceType`] at a time
//! - [`ManagementAddress`]: inventory management address (CIDR or bare host)
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//! - [`ObservedDeviceState`]: per-device operational snapshot

mod interface;
mod ip;
mod observed;
mod platform;
mod tenant;
mod topology;
mod vlan;

pub use interface::{canonical_interface_name, InterfaceType, MemberInterfaces};
pub use ip::ManagementAddress;
pub use observed::{
    Feature, FeatureInstance, FeatureTable, ObservedDeviceState, OspfTable, PortChannelEntry,
    PortChannelMember, PortChannelTable, SpanningTreeProtocol, SpanningTreeTable,
    SpanningTreeVlan, VpcEntry, VpcPeerLink, VpcTable, FEATURE_PRIMARY_INSTANCE,
    MEMBER_FLAG_BUNDLED, OS_NXOS, RAPID_PVST, VPC_KEEPALIVE_ALIVE, VPC_PEER_ADJACENCY_OK,
    VPC_PORT_STATE_UP,
};
pub use platform::{
    Platform, PlatformVersion, MODEL_IOSV, MODEL_NETSIM, PLATFORM_IOS, PLATFORM_NXOS,
};
pub use tenant::{Tenant, TenantLayer3};
pub use topology::{
    FabricInterconnect, FabricTopology, MultiswitchPeerlink, PortChannel, SpanningTreeRoot,
    Switch, SwitchPair, VCenter,
};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid management address: {0}")]
    InvalidAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid interface type: {0}")]
    InvalidInterfaceType(String),
}

/// A structural invariant of an intent snapshot that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ModelError {
    /// Model path of the offending element (e.g. `switch-pair[core]`).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ModelError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

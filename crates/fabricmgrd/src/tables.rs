//! Template keys and variable names for fabricmgrd

/// Fabric-wide VPC domain id pool
pub const TPL_VPC_DOMAIN_ID_POOL: &str = "fabric-vpc-domain-id-pool";

/// System jumbo frame size
pub const TPL_SYSTEM_JUMBO_FRAMES: &str = "fabric-system-jumbo-frames";

/// Spanning-tree mode
pub const TPL_SPANNING_TREE_MODE: &str = "fabric-spanning-tree-mode";

/// VPC domain of a switch-pair member
pub const TPL_VPC_DOMAIN_BASE: &str = "fabric-vpc-domain-base";

/// Fabric trunk port-channel interface
pub const TPL_PORTCHANNEL_INTERFACE: &str = "fabric-portchannel-interface";

/// Prefix of the port-channel member interface templates
pub const TPL_PORTCHANNEL_MEMBER_PREFIX: &str = "fabric-portchannel-member-interface";

/// Spanning-tree priority of the root bridge
pub const TPL_SPANNING_TREE_PRIORITY: &str = "fabric-spanning-tree-priority";

/// Layer-3 base configuration
pub const TPL_LAYER3_SETUP: &str = "fabric-layer3-setup";

/// Template variable names
pub mod vars {
    pub const FABRIC_NAME: &str = "FABRIC_NAME";
    pub const POOL_NAME: &str = "POOL_NAME";
    pub const DEVICE_NAME: &str = "DEVICE_NAME";
    pub const FRAME_SIZE: &str = "FRAME_SIZE";

    // VPC domain
    pub const VPC_ENABLED: &str = "VPC_ENABLED";
    pub const VPC_DOMAIN_ID: &str = "VPC_DOMAIN_ID";
    pub const VPC_PEERLINK_ID: &str = "VPC_PEERLINK_ID";
    pub const VPC_PEER_KEEPALIVE_SOURCE: &str = "VPC_PEER_KEEPALIVE_SOURCE";
    pub const VPC_PEER_KEEPALIVE_DESTINATION: &str = "VPC_PEER_KEEPALIVE_DESTINATION";
    pub const LAYER3: &str = "LAYER3";

    // Port-channels and members
    pub const PORTCHANNEL_ID: &str = "PORTCHANNEL_ID";
    pub const INTERFACE_ID: &str = "INTERFACE_ID";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const MODE: &str = "MODE";
    pub const VLAN_ID: &str = "VLAN_ID";
    pub const MTU_SIZE: &str = "MTU_SIZE";
    pub const VPC: &str = "VPC";
    pub const DISABLE_TRUNK_NEGOTIATION: &str = "DISABLE_TRUNK_NEGOTIATION";
    pub const STP_GUARD_MODE: &str = "STP_GUARD_MODE";

    // Spanning tree
    pub const STP_PRIORITY: &str = "STP_PRIORITY";
}

/// Switchport mode of fabric trunks and the peer-link
pub const TRUNK_MODE: &str = "trunk";

/// Description of peer-link member interfaces
pub const PEER_LINK_DESCRIPTION: &str = "VPC Peer Link";

/// Guard mode applied on the root bridge's trunk members
pub const STP_GUARD_ROOT: &str = "root";

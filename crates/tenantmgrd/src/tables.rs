//! Template keys and variable names for tenantmgrd

/// VRF of a tenant on one layer-3 switch
pub const TPL_TENANT_LAYER3_VRF_SETUP: &str = "tenant-layer3-vrf-setup";

/// Template variable names
pub mod vars {
    /// Target device
    pub const DEVICE_NAME: &str = "DEVICE_NAME";

    /// Device VRF name (`<tenant>_<vrf>`)
    pub const VRFNAME: &str = "VRFNAME";
}

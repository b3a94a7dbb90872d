//! Network tenant service manager
//!
//! Instantiates a tenant's VRFs on the layer-3 switch-pair of its fabric and
//! verifies that the VRFs, their OSPF processes and the required features
//! are up on those switches.

mod tables;
mod tenant_mgr;
mod types;

pub use tables::*;
pub use tenant_mgr::TenantMgr;
pub use types::*;

//! # fabricmgrd - Network Fabric Service Manager
//!
//! Turns a `network-fabric` intent snapshot into an ordered configuration
//! plan, and verifies live device state against the same intent.
//!
//! ## Responsibilities
//! - VPC domain id pool setup and per switch-pair id allocation
//! - System jumbo MTU and spanning-tree mode on every switch
//! - VPC domain, keepalive and peer-link configuration of switch-pairs
//! - Fabric trunk port-channels and their member interfaces
//! - Spanning-tree root priority and root guard
//! - Layer-3 base configuration of the layer-3 switch-pair
//! - Fabric test action (spanning tree, trunks, VPC)
//!
//! ## Platform Rules
//! Platform specific exceptions (jumbo MTU, trunk negotiation, member
//! interface templates) live in [`platform`] as a lookup table.

mod fabric_mgr;
pub mod plan;
pub mod platform;
mod tables;

pub use fabric_mgr::FabricMgr;
pub use plan::{GuardPolicy, PlanBuilder};
pub use tables::*;

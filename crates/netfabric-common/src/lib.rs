//! Common infrastructure for network fabric service managers.
//!
//! This crate provides shared functionality for the fabric and tenant
//! service managers:
//!
//! - [`resolver`]: Topology resolver (spanning-tree root, layer-3 pair)
//! - [`allocator`]: Identifier allocator client contract and an in-process store
//! - [`ServiceMgr`]: Base trait for service managers, with an explicit [`ServiceContext`]
//! - [`ConfigIntent`]: Template applications emitted for the config-push engine
//! - [`EngineConfig`]: Planning and verification settings
//! - [`error`]: Error types for fabric operations
//!
//! # Example
//!
//! ```ignore
//! use netfabric_common::{resolver, template_vars, ConfigIntent, ServiceContext};
//!
//! fn priority_intents(ctx: &ServiceContext, fabric: &FabricTopology) -> Vec<ConfigIntent> {
//!     let root = resolver::resolve_spanning_tree_root(fabric);
//!     root.members()
//!         .into_iter()
//!         .map(|switch| {
//!             tracing::info!(parent: ctx.span(), device = %switch.device, "root bridge");
//!             ConfigIntent::for_device(
//!                 "fabric-spanning-tree-priority",
//!                 &switch.device,
//!                 template_vars! { "DEVICE_NAME" => switch.device, "STP_PRIORITY" => 4096 },
//!             )
//!         })
//!         .collect()
//! }
//! ```

pub mod allocator;
pub mod config;
pub mod error;
pub mod intent;
pub mod manager;
pub mod resolver;

// Re-export commonly used items at crate root
pub use allocator::{AllocationRequest, IdAllocator, InMemoryIdAllocator};
pub use config::{EngineConfig, PlanConfig, VerificationConfig};
pub use error::{FabricError, FabricResult};
pub use intent::{
    bool_var, ConfigIntent, PendingAllocation, ReconciliationPlan, TemplateVar, TemplateVars,
    TemplateVarsExt,
};
pub use manager::{ServiceContext, ServiceKind, ServiceMgr};
pub use resolver::{RootKind, RootSelection};

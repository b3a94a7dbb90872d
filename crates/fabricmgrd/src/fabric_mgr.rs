//! FabricMgr - network fabric service manager implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use netfabric_common::{
    EngineConfig, FabricResult, IdAllocator, ReconciliationPlan, ServiceContext, ServiceKind,
    ServiceMgr,
};
use netfabric_types::FabricTopology;
use netfabric_verify::{ActionOutput, DeviceStateSource, Verifier};

use crate::plan::PlanBuilder;

/// FabricMgr manages `network-fabric` service instances
///
/// Service flow:
/// 1. create: fabric snapshot → ordered configuration intents (see [`PlanBuilder`])
/// 2. test: live device state → fabric verification report
///
/// Both paths resolve the spanning-tree root through the same resolver, so
/// what gets configured and what gets checked cannot drift apart.
pub struct FabricMgr {
    config: EngineConfig,
    allocator: Arc<dyn IdAllocator>,
}

impl FabricMgr {
    /// Creates a new FabricMgr instance
    pub fn new(config: EngineConfig, allocator: Arc<dyn IdAllocator>) -> Self {
        Self { config, allocator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the fabric test action.
    ///
    /// Content mismatches are reported in the returned output; an unreachable
    /// device or an exceeded time budget is an error.
    #[instrument(skip_all, fields(fabric = %fabric.name))]
    pub async fn test(
        &self,
        ctx: &ServiceContext,
        fabric: &FabricTopology,
        source: &dyn DeviceStateSource,
    ) -> FabricResult<ActionOutput> {
        fabric.validate()?;
        info!(parent: ctx.span(), "running fabric test action");

        let output = Verifier::new(self.config.verification.clone())
            .test_fabric(ctx, fabric, source)
            .await?;

        info!(
            parent: ctx.span(),
            success = output.success(),
            findings = output.findings().len(),
            "fabric test finished"
        );
        Ok(output)
    }
}

/// ServiceMgr trait implementation
#[async_trait]
impl ServiceMgr for FabricMgr {
    type Model = FabricTopology;

    fn daemon_name(&self) -> &str {
        "fabricmgrd"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::Fabric
    }

    #[instrument(skip_all, fields(fabric = %model.name))]
    async fn create(
        &self,
        ctx: &ServiceContext,
        model: &FabricTopology,
    ) -> FabricResult<ReconciliationPlan> {
        info!(parent: ctx.span(), "service create");
        PlanBuilder::new(&self.config.plan, self.allocator.as_ref())
            .build(ctx, model)
            .await
    }
}

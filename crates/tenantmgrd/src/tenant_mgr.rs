//! Tenant Manager - VRF lifecycle on the fabric's layer-3 switch-pair

use async_trait::async_trait;
use tracing::{info, instrument};

use netfabric_common::resolver::require_layer3_pair;
use netfabric_common::{
    template_vars, ConfigIntent, FabricResult, ReconciliationPlan, ServiceContext, ServiceKind,
    ServiceMgr, VerificationConfig,
};
use netfabric_verify::{ActionOutput, DeviceStateSource, Verifier};

use crate::tables::{vars, TPL_TENANT_LAYER3_VRF_SETUP};
use crate::types::TenantSnapshot;

/// Tenant Manager
///
/// A tenant with layer 3 enabled gets each of its VRFs on both members of
/// the fabric's layer-3 switch-pair. A fabric without one cannot host such a
/// tenant and the operation fails before anything is planned.
pub struct TenantMgr {
    verification: VerificationConfig,
}

impl TenantMgr {
    /// Create a new TenantMgr instance
    pub fn new(verification: VerificationConfig) -> Self {
        Self { verification }
    }

    /// Runs the tenant test action.
    ///
    /// Checks features, VRF presence and per-VRF OSPF on the layer-3 pair.
    /// A tenant without layer 3 has nothing to test and succeeds.
    #[instrument(skip_all, fields(tenant = %snapshot.tenant.name))]
    pub async fn test(
        &self,
        ctx: &ServiceContext,
        snapshot: &TenantSnapshot,
        source: &dyn DeviceStateSource,
    ) -> FabricResult<ActionOutput> {
        snapshot.validate()?;
        info!(parent: ctx.span(), fabric = %snapshot.fabric.name, "running tenant test action");

        Verifier::new(self.verification.clone())
            .test_tenant(ctx, &snapshot.tenant, &snapshot.fabric, source)
            .await
    }
}

impl Default for TenantMgr {
    fn default() -> Self {
        Self::new(VerificationConfig::default())
    }
}

/// ServiceMgr trait implementation
#[async_trait]
impl ServiceMgr for TenantMgr {
    type Model = TenantSnapshot;

    fn daemon_name(&self) -> &str {
        "tenantmgrd"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::Tenant
    }

    #[instrument(skip_all, fields(tenant = %snapshot.tenant.name))]
    async fn create(
        &self,
        ctx: &ServiceContext,
        snapshot: &TenantSnapshot,
    ) -> FabricResult<ReconciliationPlan> {
        snapshot.validate()?;
        let tenant = &snapshot.tenant;
        let mut plan = ReconciliationPlan::new();

        if !tenant.layer3.enabled {
            info!(parent: ctx.span(), "layer3 disabled, no VRF creation will be done");
            return Ok(plan);
        }

        let pair = require_layer3_pair(&snapshot.fabric)?;
        info!(
            parent: ctx.span(),
            pair = %pair.name,
            fabric = %snapshot.fabric.name,
            "VRFs will be created on the layer3 switch-pair"
        );

        for vrf in &tenant.layer3.vrfs {
            let vrf_name = tenant.vrf_device_name(vrf);
            for switch in &pair.switches {
                info!(parent: ctx.span(), vrf = %vrf_name, device = %switch.device, "setting up vrf");
                plan.push(ConfigIntent::for_device(
                    TPL_TENANT_LAYER3_VRF_SETUP,
                    &switch.device,
                    template_vars! {
                        vars::DEVICE_NAME => switch.device,
                        vars::VRFNAME => vrf_name,
                    },
                ));
            }
        }
        Ok(plan)
    }
}

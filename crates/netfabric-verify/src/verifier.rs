//! Fabric and tenant test batteries.
//!
//! The battery order is fixed so reports are reproducible: spanning-tree
//! protocol, spanning-tree root, trunk existence, trunk membership, VPC
//! keepalive, VPC peer-link, peer-link members, VPC status. Tenant tests run
//! features, VRF presence, then per-VRF OSPF. All tests run; none depends on
//! another's outcome.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, instrument};

use netfabric_common::resolver::{require_layer3_pair, resolve_spanning_tree_root};
use netfabric_common::{FabricResult, ServiceContext, VerificationConfig};
use netfabric_types::{FabricTopology, ObservedDeviceState, PortChannel, SwitchPair, Tenant};

use crate::checks::{layer3, spanning_tree, trunks, vpc};
use crate::device::{collect_observed_state, DeviceStateSource};
use crate::report::{ActionOutput, TestReport};

/// Observed state of every device of a pass, keyed by device name.
pub type ObservedFabric = BTreeMap<String, ObservedDeviceState>;

/// Runs the verification batteries.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerificationConfig,
}

impl Verifier {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Runs the fabric battery against already collected state.
    ///
    /// A device missing from `observed` is checked as if nothing had been
    /// discovered on it.
    pub fn verify_fabric(
        &self,
        ctx: &ServiceContext,
        fabric: &FabricTopology,
        observed: &ObservedFabric,
    ) -> TestReport {
        let mut report = TestReport::new();
        let root = resolve_spanning_tree_root(fabric);
        info!(parent: ctx.span(), fabric = %fabric.name, root = ?root.bridge_name(), "running fabric battery");

        for switch in fabric.all_switches() {
            let state = lookup(observed, &switch.device);
            spanning_tree::check_protocol(
                ctx,
                &switch.device,
                state.spanning_tree.as_ref(),
                &self.config.required_stp_protocol,
                &mut report,
            );
        }
        for switch in fabric.all_switches() {
            let state = lookup(observed, &switch.device);
            spanning_tree::check_root(
                ctx,
                &switch.device,
                state.spanning_tree.as_ref(),
                &root,
                &mut report,
            );
        }

        let owners = trunk_owners(fabric);
        for owner in &owners {
            let state = lookup(observed, owner.device);
            trunks::check_trunk_existence(
                ctx,
                owner.device,
                owner.trunks,
                state.port_channels.as_ref(),
                &owner.ignore,
                &mut report,
            );
        }
        for owner in &owners {
            let state = lookup(observed, owner.device);
            trunks::check_trunk_membership(
                ctx,
                owner.device,
                owner.trunks,
                state.port_channels.as_ref(),
                &mut report,
            );
        }

        self.verify_vpc_domains(ctx, &fabric.switch_pairs, observed, &mut report);
        report
    }

    fn verify_vpc_domains(
        &self,
        ctx: &ServiceContext,
        pairs: &[SwitchPair],
        observed: &ObservedFabric,
        report: &mut TestReport,
    ) {
        let members: Vec<(&SwitchPair, ObservedDeviceState)> = pairs
            .iter()
            .flat_map(|pair| {
                pair.switches
                    .iter()
                    .map(move |s| (pair, lookup(observed, &s.device)))
            })
            .collect();

        for (pair, state) in &members {
            vpc::check_keepalive(ctx, &pair.name, &state.device, state.vpc.as_ref(), report);
        }
        for (pair, state) in &members {
            vpc::check_peerlink(ctx, &pair.name, &state.device, state.vpc.as_ref(), report);
        }
        for (pair, state) in &members {
            vpc::check_peerlink_members(
                ctx,
                &pair.name,
                &state.device,
                state.vpc.as_ref(),
                state.port_channels.as_ref(),
                report,
            );
        }
        for (pair, state) in &members {
            vpc::check_vpc_status(
                ctx,
                &pair.name,
                &state.device,
                pair.fabric_trunks.len(),
                state.vpc.as_ref(),
                report,
            );
        }
    }

    /// Runs the tenant layer-3 battery on the members of the layer-3 pair.
    pub fn verify_tenant(
        &self,
        ctx: &ServiceContext,
        tenant: &Tenant,
        layer3_pair: &SwitchPair,
        observed: &ObservedFabric,
    ) -> TestReport {
        let mut report = TestReport::new();
        if !tenant.layer3.enabled {
            info!(parent: ctx.span(), tenant = %tenant.name, "layer3 disabled, no tests to run");
            return report;
        }

        let vrfs = tenant.vrf_device_names();
        let states: Vec<ObservedDeviceState> = layer3_pair
            .switches
            .iter()
            .map(|s| lookup(observed, &s.device))
            .collect();

        for state in &states {
            layer3::check_features(
                ctx,
                state,
                &self.config.layer3_features,
                layer3::FEATURE_ENABLED,
                &mut report,
            );
        }
        for state in &states {
            layer3::check_vrfs(ctx, &state.device, state.vrfs.as_ref(), &vrfs, true, &mut report);
        }
        for state in &states {
            layer3::check_ospf_vrfs(ctx, &state.device, state.ospf.as_ref(), &vrfs, true, &mut report);
        }
        report
    }

    /// Fabric test action: collects state from every switch and runs the
    /// fabric battery. Transport failures and timeouts are returned as
    /// errors, never as findings.
    #[instrument(skip_all, fields(fabric = %fabric.name))]
    pub async fn test_fabric(
        &self,
        ctx: &ServiceContext,
        fabric: &FabricTopology,
        source: &dyn DeviceStateSource,
    ) -> FabricResult<ActionOutput> {
        let observed =
            collect_observed_state(ctx, source, &fabric.devices(), self.config.timeout()).await?;
        Ok(self.verify_fabric(ctx, fabric, &observed).into_output())
    }

    /// Tenant test action. A tenant without layer 3 has nothing to test and
    /// succeeds without contacting any device.
    #[instrument(skip_all, fields(tenant = %tenant.name))]
    pub async fn test_tenant(
        &self,
        ctx: &ServiceContext,
        tenant: &Tenant,
        fabric: &FabricTopology,
        source: &dyn DeviceStateSource,
    ) -> FabricResult<ActionOutput> {
        if !tenant.layer3.enabled {
            info!(parent: ctx.span(), tenant = %tenant.name, "layer3 disabled, no tests to run");
            return Ok(TestReport::new().into_output());
        }

        let pair = require_layer3_pair(fabric)?;
        let devices: Vec<String> = pair.switches.iter().map(|s| s.device.clone()).collect();
        let observed = collect_observed_state(ctx, source, &devices, self.config.timeout()).await?;
        Ok(self.verify_tenant(ctx, tenant, pair, &observed).into_output())
    }
}

/// Observed state of `device`. A device that was not collected gets a state
/// with every table absent and an empty OS, which each check reports as
/// not discovered.
fn lookup(observed: &ObservedFabric, device: &str) -> ObservedDeviceState {
    observed
        .get(device)
        .cloned()
        .unwrap_or_else(|| ObservedDeviceState::new(device, ""))
}

/// A device with the fabric trunks it terminates.
struct TrunkOwner<'a> {
    device: &'a str,
    trunks: &'a [PortChannel],
    ignore: BTreeSet<String>,
}

// Pair members share the pair's trunks and ignore its peer-link.
fn trunk_owners(fabric: &FabricTopology) -> Vec<TrunkOwner<'_>> {
    let mut owners = Vec::new();
    for pair in &fabric.switch_pairs {
        let ignore: BTreeSet<String> = [pair.peerlink().name.clone()].into_iter().collect();
        for switch in &pair.switches {
            owners.push(TrunkOwner {
                device: &switch.device,
                trunks: &pair.fabric_trunks,
                ignore: ignore.clone(),
            });
        }
    }
    for switch in &fabric.switches {
        owners.push(TrunkOwner {
            device: &switch.device,
            trunks: &switch.fabric_trunks,
            ignore: BTreeSet::new(),
        });
    }
    owners
}

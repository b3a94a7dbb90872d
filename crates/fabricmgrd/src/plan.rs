//! Plan builder.
//!
//! Derives the ordered configuration intents of a fabric:
//!
//! 1. VPC domain id pool setup
//! 2. per switch-pair: member base config, VPC domain id allocation, VPC
//!    domain and peer-link, then the pair's fabric trunks
//! 3. per standalone switch: base config and fabric trunks
//! 4. spanning-tree priority on the root bridge
//! 5. layer-3 base config on the layer-3 pair
//!
//! A switch-pair whose allocation is not granted yet is suspended after its
//! base config and reported as pending; the rest of the fabric is planned.

use tracing::{debug, info, instrument};

use netfabric_common::allocator::{switch_pair_allocation_name, vpc_domain_pool_name};
use netfabric_common::resolver::{is_root_bridge, resolve_layer3_pair, resolve_spanning_tree_root};
use netfabric_common::{
    bool_var, template_vars, AllocationRequest, ConfigIntent, FabricError, FabricResult,
    IdAllocator, PendingAllocation, PlanConfig, ReconciliationPlan, RootSelection,
    ServiceContext, TemplateVars, TemplateVarsExt,
};
use netfabric_types::{FabricTopology, PortChannel, Switch, SwitchPair};

use crate::platform::{
    jumbo_mtu_value, member_interface_template_key, requires_explicit_trunk_negotiation_disable,
};
use crate::tables::{self, vars};

/// Where the spanning-tree guard mode of a member interface comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolicy<'a> {
    /// Use the given mode, possibly empty.
    Explicit(&'a str),
    /// `root` on members of the root bridge, unset elsewhere.
    FromRootBridge,
}

impl GuardPolicy<'_> {
    /// Resolves the guard mode for an interface on `switch`.
    pub fn guard_mode(&self, switch: &Switch, root: &RootSelection<'_>) -> String {
        match self {
            GuardPolicy::Explicit(mode) => mode.to_string(),
            GuardPolicy::FromRootBridge if is_root_bridge(&switch.device, root) => {
                tables::STP_GUARD_ROOT.to_string()
            }
            GuardPolicy::FromRootBridge => String::new(),
        }
    }
}

/// Builds the reconciliation plan of a fabric.
pub struct PlanBuilder<'a> {
    config: &'a PlanConfig,
    allocator: &'a dyn IdAllocator,
}

/// State of one build pass.
struct Pass<'a> {
    ctx: &'a ServiceContext,
    fabric: &'a FabricTopology,
    root: RootSelection<'a>,
    plan: ReconciliationPlan,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(config: &'a PlanConfig, allocator: &'a dyn IdAllocator) -> Self {
        Self { config, allocator }
    }

    /// Builds the plan of `fabric`.
    ///
    /// Fails on a structurally invalid snapshot and on allocator store
    /// failures. An allocation that is not granted yet is not a failure.
    #[instrument(skip_all, fields(fabric = %fabric.name))]
    pub async fn build(
        &self,
        ctx: &ServiceContext,
        fabric: &FabricTopology,
    ) -> FabricResult<ReconciliationPlan> {
        fabric.validate()?;

        let mut pass = Pass {
            ctx,
            fabric,
            root: resolve_spanning_tree_root(fabric),
            plan: ReconciliationPlan::new(),
        };

        self.setup_pools(&mut pass).await?;

        for pair in &fabric.switch_pairs {
            info!(parent: ctx.span(), pair = %pair.name, "processing switch-pair");
            self.switch_pair_create(&mut pass, pair).await?;
        }

        for switch in &fabric.switches {
            info!(parent: ctx.span(), device = %switch.device, "processing switch");
            self.switch_create(&mut pass, switch);
        }

        self.spanning_tree_root(&mut pass);

        if let Some(pair) = resolve_layer3_pair(fabric) {
            info!(parent: ctx.span(), pair = %pair.name, "applying layer3 base config");
            for switch in &pair.switches {
                pass.plan.push(ConfigIntent::for_device(
                    tables::TPL_LAYER3_SETUP,
                    &switch.device,
                    template_vars! { vars::DEVICE_NAME => switch.device },
                ));
            }
        }

        // Fabric interconnects and vCenters are configured per segment
        for fi in &fabric.fabric_interconnects {
            debug!(parent: ctx.span(), device = %fi.device, "fabric-interconnect has no fabric level config");
        }
        for vcenter in &fabric.vcenters {
            debug!(parent: ctx.span(), device = %vcenter.device, "vcenter has no fabric level config");
        }

        info!(
            parent: ctx.span(),
            intents = pass.plan.intents.len(),
            pending = pass.plan.pending.len(),
            "plan complete"
        );
        Ok(pass.plan)
    }

    async fn setup_pools(&self, pass: &mut Pass<'_>) -> FabricResult<()> {
        let pool = vpc_domain_pool_name(&pass.fabric.name);
        info!(parent: pass.ctx.span(), pool = %pool, "creating id-pool for fabric");

        self.allocator
            .ensure_pool(&pool, self.config.vpc_domain_id_range())
            .await?;
        pass.plan.push(ConfigIntent::global(
            tables::TPL_VPC_DOMAIN_ID_POOL,
            template_vars! {
                vars::FABRIC_NAME => pass.fabric.name,
                vars::POOL_NAME => pool,
            },
        ));
        Ok(())
    }

    async fn switch_pair_create(&self, pass: &mut Pass<'_>, pair: &SwitchPair) -> FabricResult<()> {
        for switch in &pair.switches {
            self.switch_base(pass, switch);
        }

        let Some(vpc_domain_id) = self.allocate_vpc_domain_id(pass, pair).await? else {
            info!(parent: pass.ctx.span(), pair = %pair.name, "VPC domain id allocation not ready");
            return Ok(());
        };
        info!(parent: pass.ctx.span(), pair = %pair.name, vpc_domain_id, "VPC domain id allocated");

        self.multiswitch_setup(pass, pair, vpc_domain_id)?;

        for switch in &pair.switches {
            for trunk in &pair.fabric_trunks {
                self.fabric_trunk_create(pass, switch, trunk, true);
            }
        }
        Ok(())
    }

    fn switch_create(&self, pass: &mut Pass<'_>, switch: &Switch) {
        debug!(parent: pass.ctx.span(), device = %switch.device, platform = %switch.platform, "switch platform");
        self.switch_base(pass, switch);
        for trunk in &switch.fabric_trunks {
            self.fabric_trunk_create(pass, switch, trunk, false);
        }
    }

    /// System jumbo MTU (when the platform takes one) and spanning-tree mode.
    fn switch_base(&self, pass: &mut Pass<'_>, switch: &Switch) {
        match jumbo_mtu_value(&switch.platform) {
            Some(frame_size) => pass.plan.push(ConfigIntent::for_device(
                tables::TPL_SYSTEM_JUMBO_FRAMES,
                &switch.device,
                template_vars! {
                    vars::FRAME_SIZE => frame_size,
                    vars::DEVICE_NAME => switch.device,
                },
            )),
            None => debug!(
                parent: pass.ctx.span(),
                device = %switch.device,
                platform = %switch.platform.name,
                model = %switch.platform.model,
                "skipping explicit jumbo MTU"
            ),
        }

        pass.plan.push(ConfigIntent::for_device(
            tables::TPL_SPANNING_TREE_MODE,
            &switch.device,
            template_vars! { vars::DEVICE_NAME => switch.device },
        ));
    }

    /// Requests the pair's VPC domain id and reads it back. `None` means the
    /// allocation is pending; it is recorded on the plan.
    async fn allocate_vpc_domain_id(
        &self,
        pass: &mut Pass<'_>,
        pair: &SwitchPair,
    ) -> FabricResult<Option<u32>> {
        let request = AllocationRequest {
            scope_path: format!("/network-fabric[name='{}']", pass.fabric.name),
            owner: pass.ctx.username().to_string(),
            pool_name: vpc_domain_pool_name(&pass.fabric.name),
            alloc_name: switch_pair_allocation_name(&pair.name),
        };

        self.allocator.request(&request).await?;
        let id = self
            .allocator
            .read(&request.owner, &request.pool_name, &request.alloc_name)
            .await?;

        if id.is_none() {
            pass.plan.pending.push(PendingAllocation {
                switch_pair: pair.name.clone(),
                pool: request.pool_name,
                allocation: request.alloc_name,
            });
        }
        Ok(id)
    }

    /// VPC domain on both members with crossed keepalive endpoints, then the
    /// peer-link member interfaces.
    fn multiswitch_setup(
        &self,
        pass: &mut Pass<'_>,
        pair: &SwitchPair,
        vpc_domain_id: u32,
    ) -> FabricResult<()> {
        let (primary, secondary) = pair.members().ok_or_else(|| {
            FabricError::invalid_model(
                format!("switch-pair[{}]/switch", pair.name),
                "a switch-pair must have exactly two switches",
            )
        })?;
        let peerlink = pair.peerlink();
        let primary_ip = keepalive_address(pair, primary)?;
        let secondary_ip = keepalive_address(pair, secondary)?;

        for (switch, source, destination) in [
            (primary, &primary_ip, &secondary_ip),
            (secondary, &secondary_ip, &primary_ip),
        ] {
            info!(
                parent: pass.ctx.span(),
                pair = %pair.name,
                device = %switch.device,
                keepalive_source = %source,
                "setting up multiswitch member"
            );
            pass.plan.push(ConfigIntent::for_device(
                tables::TPL_VPC_DOMAIN_BASE,
                &switch.device,
                template_vars! {
                    vars::DISABLE_TRUNK_NEGOTIATION =>
                        bool_var(requires_explicit_trunk_negotiation_disable(&switch.platform)),
                    vars::VPC_ENABLED => bool_var(true),
                    vars::VPC_DOMAIN_ID => vpc_domain_id,
                    vars::VPC_PEERLINK_ID => peerlink.name,
                    vars::LAYER3 => bool_var(pair.layer3),
                    // The switch sizes the peer-link itself
                    vars::MTU_SIZE => "",
                    vars::DEVICE_NAME => switch.device,
                    vars::VPC_PEER_KEEPALIVE_SOURCE => source,
                    vars::VPC_PEER_KEEPALIVE_DESTINATION => destination,
                },
            ));
        }

        for switch in &pair.switches {
            let peerlink_vars = template_vars! {
                vars::DEVICE_NAME => switch.device,
                vars::DESCRIPTION => tables::PEER_LINK_DESCRIPTION,
                vars::MODE => tables::TRUNK_MODE,
                vars::VLAN_ID => self.config.trunk_vlans,
                vars::DISABLE_TRUNK_NEGOTIATION =>
                    bool_var(requires_explicit_trunk_negotiation_disable(&switch.platform)),
                vars::MTU_SIZE => "",
            };
            self.port_channel_member_setup(
                pass,
                switch,
                peerlink,
                peerlink_vars,
                GuardPolicy::Explicit(""),
            );
        }
        Ok(())
    }

    fn fabric_trunk_create(&self, pass: &mut Pass<'_>, switch: &Switch, trunk: &PortChannel, vpc: bool) {
        info!(
            parent: pass.ctx.span(),
            device = %switch.device,
            port_channel = %trunk.name,
            description = %trunk.description,
            "setting up fabric-trunk port-channel"
        );

        let trunk_vars = template_vars! {
            vars::DEVICE_NAME => switch.device,
            vars::PORTCHANNEL_ID => trunk.name,
            vars::DESCRIPTION => trunk.description,
            vars::VPC => if vpc { bool_var(true) } else { "" },
            vars::MODE => tables::TRUNK_MODE,
            vars::VLAN_ID => self.config.trunk_vlans,
            vars::DISABLE_TRUNK_NEGOTIATION =>
                bool_var(requires_explicit_trunk_negotiation_disable(&switch.platform)),
            // Ignored by IOS, which has no interface level MTU
            vars::MTU_SIZE => self.config.fabric_trunk_mtu,
            vars::STP_GUARD_MODE => GuardPolicy::FromRootBridge.guard_mode(switch, &pass.root),
        };

        pass.plan.push(ConfigIntent::for_device(
            tables::TPL_PORTCHANNEL_INTERFACE,
            &switch.device,
            trunk_vars.clone(),
        ));
        self.port_channel_member_setup(pass, switch, trunk, trunk_vars, GuardPolicy::FromRootBridge);
    }

    /// One member interface intent per member of `port_channel`, rendered
    /// with `base` plus the member identity and guard mode.
    fn port_channel_member_setup(
        &self,
        pass: &mut Pass<'_>,
        switch: &Switch,
        port_channel: &PortChannel,
        base: TemplateVars,
        guard: GuardPolicy<'_>,
    ) {
        let members = &port_channel.member_interface;
        let template = member_interface_template_key(&switch.platform, members.interface_type());
        let guard_mode = guard.guard_mode(switch, &pass.root);
        debug!(
            parent: pass.ctx.span(),
            device = %switch.device,
            port_channel = %port_channel.name,
            interface_type = %members.interface_type(),
            members = members.len(),
            template = %template,
            "setting up member interfaces"
        );

        for interface in members.ids() {
            let mut member_vars = base.clone();
            member_vars.set_var(vars::PORTCHANNEL_ID, &port_channel.name);
            member_vars.set_var(vars::INTERFACE_ID, interface);
            member_vars.set_var(vars::STP_GUARD_MODE, &guard_mode);
            pass.plan.push(ConfigIntent::for_device(
                template.as_str(),
                &switch.device,
                member_vars,
            ));
        }
    }

    /// Elevated priority on every member of the resolved root bridge.
    fn spanning_tree_root(&self, pass: &mut Pass<'_>) {
        let Some(name) = pass.root.bridge_name() else {
            info!(parent: pass.ctx.span(), "no spanning-tree root configured");
            return;
        };
        info!(parent: pass.ctx.span(), root = %name, kind = ?pass.root.kind(), "spanning-tree root selected");

        for switch in pass.root.members() {
            pass.plan.push(ConfigIntent::for_device(
                tables::TPL_SPANNING_TREE_PRIORITY,
                &switch.device,
                template_vars! {
                    vars::DEVICE_NAME => switch.device,
                    vars::STP_PRIORITY => self.config.root_bridge_priority,
                },
            ));
        }
    }
}

/// Keepalive endpoint of a pair member: its management address without the
/// prefix length.
fn keepalive_address(pair: &SwitchPair, switch: &Switch) -> FabricResult<String> {
    switch
        .mgmt_address
        .as_ref()
        .map(|address| address.host())
        .ok_or_else(|| {
            FabricError::invalid_model(
                format!("switch-pair[{}]/switch[{}]/mgmt-address", pair.name, switch.device),
                "a switch-pair member needs a management address for the VPC keepalive",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfabric_common::{InMemoryIdAllocator, ServiceKind};
    use netfabric_types::{
        InterfaceType, ManagementAddress, MemberInterfaces, MultiswitchPeerlink, Platform,
        SpanningTreeRoot,
    };
    use pretty_assertions::assert_eq;

    fn ctx() -> ServiceContext {
        ServiceContext::new(ServiceKind::Fabric, "dc1", "admin")
    }

    fn nxos(device: &str, ip: [u8; 4]) -> Switch {
        let mut switch = Switch::new(device, Platform::new("NX-OS", "N9K", "9.3(8)"));
        switch.mgmt_address = Some(ManagementAddress::new(ip.into(), Some(24)).unwrap());
        switch
    }

    fn trunk(name: &str, ids: &[&str]) -> PortChannel {
        PortChannel::new(
            name,
            format!("to {}", name),
            MemberInterfaces::new(InterfaceType::Ethernet, ids.iter().copied()),
        )
    }

    fn pair(name: &str) -> SwitchPair {
        SwitchPair {
            name: name.to_string(),
            switches: vec![nxos("sw1", [10, 0, 0, 1]), nxos("sw2", [10, 0, 0, 2])],
            layer3: false,
            multiswitch_peerlink: MultiswitchPeerlink {
                port_channel: trunk("1", &["1/53", "1/54"]),
            },
            fabric_trunks: vec![trunk("10", &["1/1"])],
        }
    }

    fn fabric() -> FabricTopology {
        let mut fabric = FabricTopology::new("dc1");
        fabric.switch_pairs.push(pair("core"));
        fabric
    }

    async fn build(fabric: &FabricTopology, allocator: &InMemoryIdAllocator) -> FabricResult<ReconciliationPlan> {
        let config = PlanConfig::default();
        PlanBuilder::new(&config, allocator).build(&ctx(), fabric).await
    }

    #[test]
    fn test_guard_policy() {
        let fabric = {
            let mut f = fabric();
            f.spanning_tree_root = SpanningTreeRoot::SwitchPair("core".to_string());
            f
        };
        let root = resolve_spanning_tree_root(&fabric);
        let member = &fabric.switch_pairs[0].switches[0];
        let outsider = nxos("sw9", [10, 0, 0, 9]);

        assert_eq!(GuardPolicy::FromRootBridge.guard_mode(member, &root), "root");
        assert_eq!(GuardPolicy::FromRootBridge.guard_mode(&outsider, &root), "");
        assert_eq!(GuardPolicy::Explicit("").guard_mode(member, &root), "");
        assert_eq!(GuardPolicy::Explicit("loop").guard_mode(&outsider, &root), "loop");
        assert_eq!(
            GuardPolicy::FromRootBridge.guard_mode(member, &RootSelection::None),
            ""
        );
    }

    #[tokio::test]
    async fn test_vpc_domain_keepalive_crossed() {
        let plan = build(&fabric(), &InMemoryIdAllocator::new()).await.unwrap();

        let domains: Vec<&ConfigIntent> = plan.with_template(tables::TPL_VPC_DOMAIN_BASE).collect();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0].var(vars::DEVICE_NAME), Some("sw1"));
        assert_eq!(domains[0].var(vars::VPC_PEER_KEEPALIVE_SOURCE), Some("10.0.0.1"));
        assert_eq!(domains[0].var(vars::VPC_PEER_KEEPALIVE_DESTINATION), Some("10.0.0.2"));
        assert_eq!(domains[1].var(vars::VPC_PEER_KEEPALIVE_SOURCE), Some("10.0.0.2"));
        assert_eq!(domains[1].var(vars::VPC_PEER_KEEPALIVE_DESTINATION), Some("10.0.0.1"));
        assert_eq!(domains[0].var(vars::VPC_DOMAIN_ID), Some("1"));
        assert_eq!(domains[0].var(vars::VPC_PEERLINK_ID), Some("1"));
        assert_eq!(domains[0].var(vars::MTU_SIZE), Some(""));
    }

    #[tokio::test]
    async fn test_peerlink_members_never_guarded() {
        let mut fabric = fabric();
        fabric.spanning_tree_root = SpanningTreeRoot::SwitchPair("core".to_string());
        let plan = build(&fabric, &InMemoryIdAllocator::new()).await.unwrap();

        let members: Vec<&ConfigIntent> = plan
            .with_template("fabric-portchannel-member-interface-nxos")
            .collect();
        let (peerlink, trunks): (Vec<&ConfigIntent>, Vec<&ConfigIntent>) = members
            .into_iter()
            .partition(|i| i.var(vars::DESCRIPTION) == Some(tables::PEER_LINK_DESCRIPTION));

        assert_eq!(peerlink.len(), 4);
        assert!(peerlink.iter().all(|i| i.var(vars::STP_GUARD_MODE) == Some("")));
        assert_eq!(trunks.len(), 2);
        assert!(trunks.iter().all(|i| i.var(vars::STP_GUARD_MODE) == Some("root")));
        assert!(trunks.iter().all(|i| i.var(vars::VPC) == Some("true")));
    }

    #[tokio::test]
    async fn test_pending_allocation_suspends_pair_only() {
        let mut fabric = fabric();
        fabric.switches.push(nxos("leaf1", [10, 0, 0, 11]));
        fabric.switches[0].fabric_trunks.push(trunk("20", &["1/49"]));

        let allocator = InMemoryIdAllocator::deferred();
        let plan = build(&fabric, &allocator).await.unwrap();

        assert!(!plan.is_complete());
        assert_eq!(
            plan.pending,
            vec![PendingAllocation {
                switch_pair: "core".to_string(),
                pool: "VPC-DOMAIN-ID-POOL-dc1".to_string(),
                allocation: "SWITCH-PAIR-core".to_string(),
            }]
        );
        assert_eq!(plan.with_template(tables::TPL_VPC_DOMAIN_BASE).count(), 0);
        assert_eq!(plan.with_template(tables::TPL_SPANNING_TREE_MODE).count(), 3);
        // only the standalone switch's trunk
        let trunks: Vec<&ConfigIntent> = plan.with_template(tables::TPL_PORTCHANNEL_INTERFACE).collect();
        assert_eq!(trunks.len(), 1);
        assert_eq!(trunks[0].device.as_deref(), Some("leaf1"));
        assert_eq!(trunks[0].var(vars::VPC), Some(""));

        allocator.commit().unwrap();
        let plan = build(&fabric, &allocator).await.unwrap();
        assert!(plan.is_complete());
        assert_eq!(plan.with_template(tables::TPL_VPC_DOMAIN_BASE).count(), 2);
    }

    #[tokio::test]
    async fn test_missing_mgmt_address() {
        let mut fabric = fabric();
        fabric.switch_pairs[0].switches[1].mgmt_address = None;

        let err = build(&fabric, &InMemoryIdAllocator::new()).await.unwrap_err();
        assert!(matches!(err, FabricError::InvalidModel { ref field, .. } if field.contains("sw2")));
    }

    #[tokio::test]
    async fn test_allocator_offline_is_error() {
        let allocator = InMemoryIdAllocator::new();
        allocator.set_offline(true);
        let err = build(&fabric(), &allocator).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_singleton_root_priority() {
        let mut fabric = fabric();
        fabric.switches.push(nxos("leaf1", [10, 0, 0, 11]));
        fabric.spanning_tree_root = SpanningTreeRoot::Switch("leaf1".to_string());

        let plan = build(&fabric, &InMemoryIdAllocator::new()).await.unwrap();
        let priority: Vec<&ConfigIntent> = plan
            .with_template(tables::TPL_SPANNING_TREE_PRIORITY)
            .collect();
        assert_eq!(priority.len(), 1);
        assert_eq!(priority[0].var(vars::DEVICE_NAME), Some("leaf1"));
        assert_eq!(priority[0].var(vars::STP_PRIORITY), Some("4096"));
    }

    #[tokio::test]
    async fn test_layer3_and_ios_rules() {
        let mut fabric = fabric();
        fabric.switch_pairs[0].layer3 = true;
        let mut access = Switch::new("acc1", Platform::new("ios", "3750", "15.2(4)E8"));
        access.fabric_trunks.push(PortChannel::new(
            "30",
            "uplink",
            MemberInterfaces::new(InterfaceType::GigabitEthernet, ["1/0/49"]),
        ));
        fabric.switches.push(access);

        let plan = build(&fabric, &InMemoryIdAllocator::new()).await.unwrap();

        let layer3: Vec<Option<&str>> = plan
            .with_template(tables::TPL_LAYER3_SETUP)
            .map(|i| i.device.as_deref())
            .collect();
        assert_eq!(layer3, vec![Some("sw1"), Some("sw2")]);

        let jumbo: Vec<&ConfigIntent> = plan.with_template(tables::TPL_SYSTEM_JUMBO_FRAMES).collect();
        assert_eq!(jumbo.len(), 1);
        assert_eq!(jumbo[0].var(vars::FRAME_SIZE), Some("9216"));

        let member = plan
            .with_template("fabric-portchannel-member-interface-ios-gigabitethernet")
            .next()
            .unwrap();
        assert_eq!(member.var(vars::DISABLE_TRUNK_NEGOTIATION), Some("true"));
        assert_eq!(member.var(vars::INTERFACE_ID), Some("1/0/49"));
    }

    #[tokio::test]
    async fn test_invalid_model_rejected_before_planning() {
        let mut fabric = fabric();
        fabric.switch_pairs[0].switches.pop();
        let allocator = InMemoryIdAllocator::new();

        let err = build(&fabric, &allocator).await.unwrap_err();
        assert!(matches!(err, FabricError::InvalidModel { .. }));
    }
}

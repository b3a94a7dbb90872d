//! VPC domain checks, run per switch-pair member.
//!
//! Every check distinguishes a status that was discovered and is wrong from
//! a status that was not discovered at all.

use tracing::debug;

use netfabric_common::ServiceContext;
use netfabric_types::{
    PortChannelTable, VpcTable, VPC_KEEPALIVE_ALIVE, VPC_PEER_ADJACENCY_OK, VPC_PORT_STATE_UP,
};

use crate::report::{test_names, TestReport};

fn not_discovered(pair: &str, device: &str) -> String {
    format!(
        "switch-pair {}, switch {}, no vpc operational status discovered",
        pair, device
    )
}

/// Checks that the peer keepalive is alive.
pub fn check_keepalive(
    ctx: &ServiceContext,
    pair: &str,
    device: &str,
    vpc: Option<&VpcTable>,
    report: &mut TestReport,
) {
    debug!(parent: ctx.span(), pair, device, "checking vpc keepalive");
    match vpc.and_then(|v| v.vpc_peer_keepalive_status.as_deref()) {
        None => report.record(test_names::VPC_KEEPALIVE, not_discovered(pair, device)),
        Some(status) if status != VPC_KEEPALIVE_ALIVE => report.record(
            test_names::VPC_KEEPALIVE,
            format!("switch-pair {}, switch {}, vpc keepalive down", pair, device),
        ),
        Some(_) => {}
    }
}

/// Checks that the peer adjacency is formed; reports the observed status
/// otherwise.
pub fn check_peerlink(
    ctx: &ServiceContext,
    pair: &str,
    device: &str,
    vpc: Option<&VpcTable>,
    report: &mut TestReport,
) {
    debug!(parent: ctx.span(), pair, device, "checking vpc peer status");
    match vpc.and_then(|v| v.vpc_peer_status.as_deref()) {
        None => report.record(test_names::VPC_PEERLINK, not_discovered(pair, device)),
        Some(status) if status != VPC_PEER_ADJACENCY_OK => report.record(
            test_names::VPC_PEERLINK,
            format!("switch-pair {}, switch {}, {}", pair, device, status),
        ),
        Some(_) => {}
    }
}

/// Checks that every member of the peer-link port-channel is bundled.
pub fn check_peerlink_members(
    ctx: &ServiceContext,
    pair: &str,
    device: &str,
    vpc: Option<&VpcTable>,
    port_channels: Option<&PortChannelTable>,
    report: &mut TestReport,
) {
    let Some(peer_links) = vpc.and_then(|v| v.peer_link.as_ref()) else {
        report.record(test_names::VPC_PEERLINK_MEMBER, not_discovered(pair, device));
        return;
    };

    for peer_link in peer_links.values() {
        debug!(
            parent: ctx.span(),
            pair,
            device,
            peer_link_id = %peer_link.peer_link_id,
            ifindex = %peer_link.peer_link_ifindex,
            port_state = %peer_link.peer_link_port_state,
            "checking peer-link members"
        );
        let Some(entry) = port_channels.and_then(|pcs| pcs.by_id(&peer_link.peer_link_id)) else {
            report.record(test_names::VPC_PEERLINK_MEMBER, not_discovered(pair, device));
            continue;
        };
        for (member, state) in &entry.members {
            if !state.is_bundled() {
                report.record(
                    test_names::VPC_PEERLINK_MEMBER,
                    format!(
                        "switch-pair {}, switch {}, peer-link member interface {} status {}",
                        pair, device, member, state.flags
                    ),
                );
            }
        }
    }
}

/// Checks that every VPC is up.
///
/// Skipped without findings when the pair has no VPCs: either none are
/// configured (`configured_vpcs == 0`) or the device reports zero.
pub fn check_vpc_status(
    ctx: &ServiceContext,
    pair: &str,
    device: &str,
    configured_vpcs: usize,
    vpc: Option<&VpcTable>,
    report: &mut TestReport,
) {
    if configured_vpcs == 0 {
        debug!(parent: ctx.span(), pair, device, "no vpcs configured");
        return;
    }
    let Some((table, count)) = vpc.and_then(|v| v.num_of_vpcs.map(|n| (v, n))) else {
        report.record(test_names::VPC_STATUS, not_discovered(pair, device));
        return;
    };
    if count == 0 {
        debug!(parent: ctx.span(), pair, device, "device has no vpcs");
        return;
    }

    for (vpc_id, entry) in &table.vpc {
        if entry.vpc_port_state != VPC_PORT_STATE_UP {
            report.record(
                test_names::VPC_STATUS,
                format!(
                    "switch-pair {}, switch {}, vpc {} for Port-channel {} is {}",
                    pair, device, vpc_id, entry.vpc_ifindex, entry.vpc_port_state
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfabric_common::ServiceKind;
    use netfabric_types::{PortChannelEntry, PortChannelMember, VpcEntry, VpcPeerLink};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn ctx() -> ServiceContext {
        ServiceContext::new(ServiceKind::Fabric, "dc1", "admin")
    }

    fn healthy() -> VpcTable {
        let mut peer_link = BTreeMap::new();
        peer_link.insert(
            "1".to_string(),
            VpcPeerLink {
                peer_link_id: "1".to_string(),
                peer_link_ifindex: "Po1".to_string(),
                peer_link_port_state: "up".to_string(),
            },
        );
        let mut vpc = BTreeMap::new();
        vpc.insert(
            "10".to_string(),
            VpcEntry {
                vpc_ifindex: "Po10".to_string(),
                vpc_port_state: "up".to_string(),
            },
        );
        VpcTable {
            vpc_peer_keepalive_status: Some("peer is alive".to_string()),
            vpc_peer_status: Some("peer adjacency formed ok".to_string()),
            peer_link: Some(peer_link),
            num_of_vpcs: Some(1),
            vpc,
        }
    }

    fn peerlink_channels(flags: &[(&str, &str)]) -> PortChannelTable {
        let mut entry = PortChannelEntry {
            bundle_id: 1,
            ..Default::default()
        };
        for (name, flag) in flags {
            entry
                .members
                .insert(name.to_string(), PortChannelMember::new(*flag));
        }
        let mut table = PortChannelTable::default();
        table.interfaces.insert("Port-channel1".to_string(), entry);
        table
    }

    fn run_all(vpc: Option<&VpcTable>, pcs: Option<&PortChannelTable>) -> TestReport {
        let ctx = ctx();
        let mut report = TestReport::new();
        check_keepalive(&ctx, "core", "sw1", vpc, &mut report);
        check_peerlink(&ctx, "core", "sw1", vpc, &mut report);
        check_peerlink_members(&ctx, "core", "sw1", vpc, pcs, &mut report);
        check_vpc_status(&ctx, "core", "sw1", 1, vpc, &mut report);
        report
    }

    #[test]
    fn test_healthy_domain() {
        let vpc = healthy();
        let pcs = peerlink_channels(&[("Eth1/53", "P"), ("Eth1/54", "P")]);
        assert!(run_all(Some(&vpc), Some(&pcs)).is_empty());
    }

    #[test]
    fn test_not_discovered_is_distinct_from_down() {
        let report = run_all(None, None);
        let tests: Vec<&str> = report.findings().iter().map(|f| f.test.as_str()).collect();
        assert_eq!(
            tests,
            vec![
                test_names::VPC_KEEPALIVE,
                test_names::VPC_PEERLINK,
                test_names::VPC_PEERLINK_MEMBER,
                test_names::VPC_STATUS,
            ]
        );
        assert!(report
            .findings()
            .iter()
            .all(|f| f.message == "switch-pair core, switch sw1, no vpc operational status discovered"));
    }

    #[test]
    fn test_down_statuses() {
        let mut vpc = healthy();
        vpc.vpc_peer_keepalive_status = Some("peer is not reachable through peer-keepalive".to_string());
        vpc.vpc_peer_status = Some("peer link is down".to_string());
        if let Some(entry) = vpc.vpc.get_mut("10") {
            entry.vpc_port_state = "down".to_string();
        }
        let pcs = peerlink_channels(&[("Eth1/53", "P"), ("Eth1/54", "D")]);

        let report = run_all(Some(&vpc), Some(&pcs));
        let messages: Vec<&str> = report.findings().iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "switch-pair core, switch sw1, vpc keepalive down",
                "switch-pair core, switch sw1, peer link is down",
                "switch-pair core, switch sw1, peer-link member interface Eth1/54 status D",
                "switch-pair core, switch sw1, vpc 10 for Port-channel Po10 is down",
            ]
        );
    }

    #[test]
    fn test_zero_vpcs_no_findings() {
        let ctx = ctx();
        let mut vpc = healthy();
        vpc.num_of_vpcs = Some(0);
        if let Some(entry) = vpc.vpc.get_mut("10") {
            entry.vpc_port_state = "down".to_string();
        }

        let mut report = TestReport::new();
        check_vpc_status(&ctx, "core", "sw1", 1, Some(&vpc), &mut report);
        check_vpc_status(&ctx, "core", "sw1", 0, Some(&vpc), &mut report);
        check_vpc_status(&ctx, "core", "sw1", 0, None, &mut report);
        assert!(report.is_empty());
    }

    #[test]
    fn test_peerlink_port_channel_missing() {
        let vpc = healthy();
        let mut report = TestReport::new();
        check_peerlink_members(&ctx(), "core", "sw1", Some(&vpc), None, &mut report);
        assert_eq!(report.len(), 1);
        assert_eq!(report.findings()[0].test, test_names::VPC_PEERLINK_MEMBER);
    }
}

//! Spanning-tree protocol and root bridge checks.

use tracing::{debug, info};

use netfabric_common::resolver::is_root_bridge;
use netfabric_common::{RootSelection, ServiceContext};
use netfabric_types::SpanningTreeTable;

use crate::report::{test_names, TestReport};

/// Checks that every spanning-tree protocol instance on the device is the
/// required one (`rapid_pvst`).
pub fn check_protocol(
    ctx: &ServiceContext,
    device: &str,
    table: Option<&SpanningTreeTable>,
    required: &str,
    report: &mut TestReport,
) {
    // An empty table carries no protocol to judge
    let Some(table) = table.filter(|table| !table.is_empty()) else {
        report.record(
            test_names::STP_PROTOCOL,
            format!("device {} has no spanning-tree operational status discovered", device),
        );
        return;
    };

    if table.keys().all(|protocol| protocol == required) {
        debug!(parent: ctx.span(), device, "spanning-tree protocol ok");
        return;
    }

    // Keys of the ordered table are already sorted
    let running: Vec<&str> = table.keys().map(String::as_str).collect();
    info!(parent: ctx.span(), device, ?running, "unexpected spanning-tree protocol");
    report.record(
        test_names::STP_PROTOCOL,
        format!(
            "device {} is running Spanning-Tree Protocol {}. It should be \"{}\"",
            device,
            running.join(", "),
            required.replace('_', "-")
        ),
    );
}

/// Checks the per-VLAN root flag of a device against the resolved root.
///
/// Root members must be root for every VLAN; every other device must be
/// root for none. Skipped when no root is configured.
pub fn check_root(
    ctx: &ServiceContext,
    device: &str,
    table: Option<&SpanningTreeTable>,
    root: &RootSelection<'_>,
    report: &mut TestReport,
) {
    if root.is_none() {
        debug!(parent: ctx.span(), device, "no spanning-tree root configured, skipping root check");
        return;
    }
    // A missing table is reported once, by the protocol check
    let Some(table) = table else {
        return;
    };

    let should_be_root = is_root_bridge(device, root);
    for (protocol, state) in table {
        debug!(parent: ctx.span(), device, protocol = %protocol, "checking root per vlan");
        for (vlan, vlan_state) in &state.vlans {
            match (should_be_root, vlan_state.is_root()) {
                (true, false) => report.record(
                    test_names::STP_ROOT,
                    format!(
                        "Device {} is NOT the Spanning-Tree root for VLAN {} but should be.",
                        device, vlan
                    ),
                ),
                (false, true) => report.record(
                    test_names::STP_ROOT,
                    format!(
                        "Device {} is the Spanning-Tree root for VLAN {} but should NOT be.",
                        device, vlan
                    ),
                ),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfabric_common::ServiceKind;
    use netfabric_types::{Platform, SpanningTreeProtocol, SpanningTreeVlan, Switch, VlanId};
    use pretty_assertions::assert_eq;

    fn ctx() -> ServiceContext {
        ServiceContext::new(ServiceKind::Fabric, "dc1", "admin")
    }

    fn table(protocol: &str, vlans: &[(u16, Option<bool>)]) -> SpanningTreeTable {
        let mut proto = SpanningTreeProtocol::default();
        for (vlan, flag) in vlans {
            proto.vlans.insert(
                VlanId::new(*vlan).unwrap(),
                SpanningTreeVlan {
                    root_of_the_spanning_tree: *flag,
                },
            );
        }
        let mut table = SpanningTreeTable::new();
        table.insert(protocol.to_string(), proto);
        table
    }

    fn messages(report: &TestReport) -> Vec<String> {
        report.findings().iter().map(|f| f.message.clone()).collect()
    }

    #[test]
    fn test_protocol_ok() {
        let mut report = TestReport::new();
        let stp = table("rapid_pvst", &[(1, None)]);
        check_protocol(&ctx(), "sw1", Some(&stp), "rapid_pvst", &mut report);
        assert!(report.is_empty());
    }

    #[test]
    fn test_protocol_wrong() {
        let mut report = TestReport::new();
        let stp = table("mstp", &[(1, None)]);
        check_protocol(&ctx(), "sw1", Some(&stp), "rapid_pvst", &mut report);
        assert_eq!(
            messages(&report),
            vec!["device sw1 is running Spanning-Tree Protocol mstp. It should be \"rapid-pvst\""]
        );
        assert_eq!(report.findings()[0].test, test_names::STP_PROTOCOL);
    }

    #[test]
    fn test_protocol_mixed_lists_all() {
        let mut report = TestReport::new();
        let mut stp = table("rapid_pvst", &[(1, None)]);
        stp.extend(table("mstp", &[(1, None)]));
        check_protocol(&ctx(), "sw1", Some(&stp), "rapid_pvst", &mut report);
        assert_eq!(
            messages(&report),
            vec!["device sw1 is running Spanning-Tree Protocol mstp, rapid_pvst. It should be \"rapid-pvst\""]
        );
    }

    #[test]
    fn test_protocol_not_discovered() {
        let mut report = TestReport::new();
        check_protocol(&ctx(), "sw1", None, "rapid_pvst", &mut report);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_protocol_empty_table_not_discovered() {
        let mut report = TestReport::new();
        check_protocol(&ctx(), "sw1", Some(&SpanningTreeTable::new()), "rapid_pvst", &mut report);
        assert_eq!(
            messages(&report),
            vec!["device sw1 has no spanning-tree operational status discovered"]
        );
    }

    #[test]
    fn test_root_both_directions() {
        let root_switch = Switch::new("sw1", Platform::new("NX-OS", "N9K", "9.3"));
        let root = RootSelection::Switch(&root_switch);

        let mut report = TestReport::new();
        let stp = table("rapid_pvst", &[(1, Some(true)), (10, None)]);
        check_root(&ctx(), "sw1", Some(&stp), &root, &mut report);
        check_root(&ctx(), "sw2", Some(&stp), &root, &mut report);

        assert_eq!(
            messages(&report),
            vec![
                "Device sw1 is NOT the Spanning-Tree root for VLAN 10 but should be.",
                "Device sw2 is the Spanning-Tree root for VLAN 1 but should NOT be.",
            ]
        );
    }

    #[test]
    fn test_root_explicit_false_flag() {
        let root_switch = Switch::new("sw1", Platform::new("NX-OS", "N9K", "9.3"));
        let root = RootSelection::Switch(&root_switch);
        let mut report = TestReport::new();
        let stp = table("rapid_pvst", &[(1, Some(false))]);
        check_root(&ctx(), "sw1", Some(&stp), &root, &mut report);
        check_root(&ctx(), "sw2", Some(&stp), &root, &mut report);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_root_unset_skips() {
        let mut report = TestReport::new();
        let stp = table("rapid_pvst", &[(1, Some(true))]);
        check_root(&ctx(), "sw1", Some(&stp), &RootSelection::None, &mut report);
        assert!(report.is_empty());
    }
}

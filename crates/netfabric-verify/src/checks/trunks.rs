//! Fabric trunk existence and membership checks.

use std::collections::BTreeSet;

use tracing::{debug, info};

use netfabric_common::ServiceContext;
use netfabric_types::{canonical_interface_name, PortChannel, PortChannelTable};

use crate::report::{join_sorted, test_names, TestReport};

/// Compares configured fabric trunk ids with the observed port-channel ids.
///
/// The ignore set (the peer-link of a switch-pair) is removed from both the
/// configured and the observed side before comparing, so an ignored id is
/// never reported as missing or as extra.
pub fn check_trunk_existence(
    ctx: &ServiceContext,
    device: &str,
    configured: &[PortChannel],
    observed: Option<&PortChannelTable>,
    ignore: &BTreeSet<String>,
    report: &mut TestReport,
) {
    let Some(observed) = observed else {
        report.record(
            test_names::TRUNK_EXIST,
            format!("switch {} has no port-channel operational status discovered", device),
        );
        return;
    };

    let configured: BTreeSet<String> = configured.iter().map(|t| t.name.clone()).collect();
    let (missing, extra) = trunk_differences(&configured, &observed.bundle_ids(), ignore);
    debug!(parent: ctx.span(), device, ?missing, ?extra, "fabric trunk existence");

    if !missing.is_empty() {
        report.record(
            test_names::TRUNK_EXIST,
            format!(
                "switch {} is missing port-channels for fabric-trunks [{}]",
                device,
                join_sorted(&missing)
            ),
        );
    }
    if !extra.is_empty() {
        report.record(
            test_names::TRUNK_EXIST,
            format!(
                "switch {} has extra port-channels [{}]",
                device,
                join_sorted(&extra)
            ),
        );
    }
}

/// Returns `(missing, extra)`: configured ids not observed, and observed ids
/// not configured, both with the ignored ids removed.
pub fn trunk_differences(
    configured: &BTreeSet<String>,
    observed: &BTreeSet<String>,
    ignore: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let missing = configured
        .difference(observed)
        .filter(|id| !ignore.contains(*id))
        .cloned()
        .collect();
    let extra = observed
        .difference(configured)
        .filter(|id| !ignore.contains(*id))
        .cloned()
        .collect();
    (missing, extra)
}

/// Checks the members of every configured trunk: the port-channel must be
/// operational, its member set must equal the configured one, and every
/// member must be bundled.
///
/// A missing port-channel table is reported by the existence check.
pub fn check_trunk_membership(
    ctx: &ServiceContext,
    device: &str,
    configured: &[PortChannel],
    observed: Option<&PortChannelTable>,
    report: &mut TestReport,
) {
    let Some(observed) = observed else {
        return;
    };

    for trunk in configured {
        let pc_name = trunk.interface_name();
        let Some(entry) = observed.by_id(&trunk.name) else {
            info!(parent: ctx.span(), device, port_channel = %pc_name, "port-channel not operational");
            report.record(
                test_names::TRUNK_MEMBER,
                format!("{} is not operational on switch {}", pc_name, device),
            );
            continue;
        };

        let expected: BTreeSet<String> =
            trunk.member_interface.interface_names().into_iter().collect();
        let actual = entry.canonical_members();
        if expected != actual {
            report.record(
                test_names::TRUNK_MEMBER,
                format!(
                    "{} on switch {} member interfaces incorrect. Should be [{}] but is [{}]",
                    pc_name,
                    device,
                    join_sorted(&expected),
                    join_sorted(&actual)
                ),
            );
        }

        for (member, state) in &entry.members {
            if !state.is_bundled() {
                report.record(
                    test_names::TRUNK_MEMBER,
                    format!(
                        "{} on switch {} member interface {} is not up. Currently has flag {}",
                        pc_name,
                        device,
                        canonical_interface_name(member),
                        state.flags
                    ),
                );
            }
        }
    }
}

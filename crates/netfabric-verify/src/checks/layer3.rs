//! Layer-3 checks: feature enablement, VRF presence and per-VRF OSPF.
//!
//! VRF and OSPF checks are direction aware: with `desired_state == false`
//! they report VRFs that are present instead of VRFs that are missing.
//! A table the device did not report is a finding in either direction.

use std::collections::BTreeSet;

use tracing::{debug, info};

use netfabric_common::ServiceContext;
use netfabric_types::{ObservedDeviceState, OspfTable};

use crate::report::{test_names, TestReport};

/// Feature state that counts as enabled.
pub const FEATURE_ENABLED: &str = "enabled";

fn not_discovered(device: &str, table: &str) -> String {
    format!("device {} has no {} operational status discovered", device, table)
}

/// Checks that every requested feature's primary instance is in
/// `desired_state`. Only NX-OS devices report features; any other device
/// produces a single finding naming its OS.
pub fn check_features(
    ctx: &ServiceContext,
    state: &ObservedDeviceState,
    features: &[String],
    desired_state: &str,
    report: &mut TestReport,
) {
    let device = state.device.as_str();
    info!(parent: ctx.span(), device, ?features, "looking for features");

    if state.os.is_empty() {
        report.record(test_names::FEATURE_ENABLED, not_discovered(device, "feature"));
        return;
    }
    if !state.is_nxos() {
        report.record(
            test_names::FEATURE_ENABLED,
            format!(
                "device {} is not an NX-OS device. Its OS is {}.",
                device, state.os
            ),
        );
        return;
    }

    let Some(table) = state.features.as_ref() else {
        report.record(test_names::FEATURE_ENABLED, not_discovered(device, "feature"));
        return;
    };

    for feature in features {
        let observed = table.get(feature).and_then(|f| f.primary_state());
        match observed {
            None => report.record(
                test_names::FEATURE_ENABLED,
                format!("Feature {} not found on device {}.", feature, device),
            ),
            Some(current) if current != desired_state => report.record(
                test_names::FEATURE_ENABLED,
                format!(
                    "Feature {} is not {} on device {}.",
                    feature, desired_state, device
                ),
            ),
            Some(_) => {}
        }
    }
}

/// Checks that VRF presence matches `desired_state`.
pub fn check_vrfs(
    ctx: &ServiceContext,
    device: &str,
    observed: Option<&BTreeSet<String>>,
    vrfs: &[String],
    desired_state: bool,
    report: &mut TestReport,
) {
    debug!(parent: ctx.span(), device, ?vrfs, desired_state, "looking for vrfs");
    let Some(observed) = observed else {
        report.record(test_names::TENANT_VRFS, not_discovered(device, "vrf"));
        return;
    };

    for vrf in vrfs {
        let present = observed.contains(vrf);
        if desired_state && !present {
            report.record(
                test_names::TENANT_VRFS,
                format!("VRF {} not found on device {}.", vrf, device),
            );
        } else if !desired_state && present {
            report.record(
                test_names::TENANT_VRFS,
                format!(
                    "VRF {} WAS found on device {} (but desired_state was False).",
                    vrf, device
                ),
            );
        }
    }
}

/// Checks that OSPF is running and that each VRF's OSPF presence matches
/// `desired_state`. OSPF not running globally yields one finding and
/// nothing else.
pub fn check_ospf_vrfs(
    ctx: &ServiceContext,
    device: &str,
    observed: Option<&OspfTable>,
    vrfs: &[String],
    desired_state: bool,
    report: &mut TestReport,
) {
    debug!(parent: ctx.span(), device, ?vrfs, desired_state, "looking for ospf vrfs");
    let Some(ospf) = observed else {
        report.record(test_names::TENANT_OSPF_VRFS, not_discovered(device, "ospf"));
        return;
    };
    if !ospf.feature_ospf {
        report.record(
            test_names::TENANT_OSPF_VRFS,
            format!("OSPF is NOT running on device {}.", device),
        );
        return;
    }

    for vrf in vrfs {
        let present = ospf.vrfs.contains(vrf);
        if desired_state && !present {
            report.record(
                test_names::TENANT_OSPF_VRFS,
                format!("OSPF state for VRF {} not found on device {}.", vrf, device),
            );
        } else if !desired_state && present {
            report.record(
                test_names::TENANT_OSPF_VRFS,
                format!(
                    "OSPF state for VRF {} WAS found on device {} (but desired_state was False).",
                    vrf, device
                ),
            );
        }
    }
}

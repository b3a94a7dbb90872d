//! Platform rule table.
//!
//! Maps a platform descriptor to the configuration exceptions of that
//! platform. Every function is total: a platform no row matches falls
//! through to the default branch. New quirks are new rows.

use netfabric_types::{InterfaceType, Platform, MODEL_IOSV, MODEL_NETSIM, PLATFORM_IOS, PLATFORM_NXOS};

use crate::tables::TPL_PORTCHANNEL_MEMBER_PREFIX;

/// Frame size configured when no row applies.
pub const DEFAULT_JUMBO_MTU: &str = "9216";

/// Frame size ceiling of Catalyst 3850/9300 class switches.
pub const CATALYST_JUMBO_MTU: &str = "9198";

/// Major version from which IOS stops negotiating ISL/dot1q trunks.
pub const TRUNK_NEGOTIATION_FIXED_MAJOR: u32 = 16;

/// One row of the jumbo MTU table. `None`/empty selectors match anything.
struct JumboMtuRule {
    platform: Option<&'static str>,
    models: &'static [&'static str],
    frame_size: Option<&'static str>,
}

impl JumboMtuRule {
    fn matches(&self, platform: &Platform) -> bool {
        self.platform.map_or(true, |name| platform.name == name)
            && (self.models.is_empty() || self.models.contains(&platform.model.as_str()))
    }
}

// First matching row wins.
const JUMBO_MTU_RULES: &[JumboMtuRule] = &[
    // NX-OS defaults to 9216; setting it explicitly breaks compare-config
    JumboMtuRule {
        platform: Some(PLATFORM_NXOS),
        models: &[],
        frame_size: None,
    },
    // virtual IOS L2 has no system-wide MTU
    JumboMtuRule {
        platform: None,
        models: &[MODEL_IOSV],
        frame_size: None,
    },
    JumboMtuRule {
        platform: Some(PLATFORM_IOS),
        models: &["3850", "9300", MODEL_NETSIM],
        frame_size: Some(CATALYST_JUMBO_MTU),
    },
];

/// Returns the system jumbo frame size to configure, or `None` when the
/// platform must not be given one explicitly.
pub fn jumbo_mtu_value(platform: &Platform) -> Option<&'static str> {
    JUMBO_MTU_RULES
        .iter()
        .find(|rule| rule.matches(platform))
        .map_or(Some(DEFAULT_JUMBO_MTU), |rule| rule.frame_size)
}

/// Returns true when trunk negotiation has to be disabled explicitly.
///
/// Legacy IOS switches negotiate between ISL and dot1q. Simulated devices
/// never need it. An unparsable version is not considered legacy.
pub fn requires_explicit_trunk_negotiation_disable(platform: &Platform) -> bool {
    platform.is_ios()
        && !platform.is_netsim()
        && platform
            .version
            .is_major_below(TRUNK_NEGOTIATION_FIXED_MAJOR)
}

/// Selects the member interface template for a platform and interface type.
pub fn member_interface_template_key(platform: &Platform, interface_type: InterfaceType) -> String {
    let kind = interface_type.name().to_ascii_lowercase();
    if platform.is_nxos() && interface_type == InterfaceType::Ethernet {
        format!("{}-nxos", TPL_PORTCHANNEL_MEMBER_PREFIX)
    } else if platform.is_ios() {
        format!("{}-ios-{}", TPL_PORTCHANNEL_MEMBER_PREFIX, kind)
    } else {
        format!(
            "{}-{}-{}",
            TPL_PORTCHANNEL_MEMBER_PREFIX,
            platform.name.to_ascii_lowercase(),
            kind
        )
    }
}

//! Device platform descriptor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading `major[.minor]` of a software version string.
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)(?:\.(\d+))?").expect("Invalid regex pattern"));

/// Platform name reported for Nexus switches.
pub const PLATFORM_NXOS: &str = "NX-OS";

/// Platform name reported for classic IOS switches.
pub const PLATFORM_IOS: &str = "ios";

/// Model reported by simulated (netsim) devices.
pub const MODEL_NETSIM: &str = "NETSIM";

/// Model reported by virtual IOS L2 images.
pub const MODEL_IOSV: &str = "IOSv";

/// Platform descriptor of a managed device: `{name, model, version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub version: PlatformVersion,
}

impl Platform {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            version: PlatformVersion::parse(version.into()),
        }
    }

    pub fn is_nxos(&self) -> bool {
        self.name == PLATFORM_NXOS
    }

    pub fn is_ios(&self) -> bool {
        self.name == PLATFORM_IOS
    }

    /// Returns true for simulated devices standing in for real hardware.
    pub fn is_netsim(&self) -> bool {
        self.model == MODEL_NETSIM
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.model, self.version)
    }
}

/// Software version with the numeric major/minor parsed out.
///
/// Vendor version strings (`15.2(4)E8`, `16.9.3`, `9.3(8)`) only share a
/// numeric prefix. A string without one keeps its raw form and has no major
/// version; threshold comparisons treat it as not below any threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlatformVersion {
    raw: String,
    major: Option<u32>,
    minor: Option<u32>,
}

impl PlatformVersion {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (major, minor) = match VERSION_RE.captures(&raw) {
            Some(caps) => (
                caps.get(1).and_then(|m| m.as_str().parse().ok()),
                caps.get(2).and_then(|m| m.as_str().parse().ok()),
            ),
            None => (None, None),
        };
        Self { raw, major, minor }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub const fn major(&self) -> Option<u32> {
        self.major
    }

    pub const fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// Returns true if the major version is known and below `threshold`.
    pub fn is_major_below(&self, threshold: u32) -> bool {
        self.major.is_some_and(|major| major < threshold)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<String> for PlatformVersion {
    fn from(raw: String) -> Self {
        PlatformVersion::parse(raw)
    }
}

impl From<&str> for PlatformVersion {
    fn from(raw: &str) -> Self {
        PlatformVersion::parse(raw)
    }
}

impl From<PlatformVersion> for String {
    fn from(version: PlatformVersion) -> String {
        version.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_parse() {
        let v = PlatformVersion::parse("15.2(4)E8");
        assert_eq!(v.major(), Some(15));
        assert_eq!(v.minor(), Some(2));

        let v = PlatformVersion::parse("16.9.3");
        assert_eq!(v.major(), Some(16));
        assert_eq!(v.minor(), Some(9));

        let v = PlatformVersion::parse("9.3(8)");
        assert_eq!(v.major(), Some(9));
    }

    #[test]
    fn test_version_unparsable() {
        let v = PlatformVersion::parse("unknown");
        assert_eq!(v.major(), None);
        assert!(!v.is_major_below(16));
        assert_eq!(v.raw(), "unknown");
    }

    #[test]
    fn test_major_threshold() {
        assert!(PlatformVersion::parse("15.2(7)E").is_major_below(16));
        assert!(!PlatformVersion::parse("16.12.4").is_major_below(16));
        assert!(!PlatformVersion::parse("17.3.1").is_major_below(16));
    }

    #[test]
    fn test_platform_flags() {
        let nexus = Platform::new("NX-OS", "N9K-C93180YC-EX", "9.3(8)");
        assert!(nexus.is_nxos());
        assert!(!nexus.is_ios());

        let sim = Platform::new("ios", "NETSIM", "15.0");
        assert!(sim.is_ios());
        assert!(sim.is_netsim());
    }

    #[test]
    fn test_platform_serde() {
        let platform: Platform =
            serde_json::from_str(r#"{"name": "ios", "model": "3850", "version": "16.9.3"}"#)
                .unwrap();
        assert_eq!(platform.version.major(), Some(16));
        assert_eq!(platform.model, "3850");
    }
}

//! Interface type definitions and port-channel member selection.

use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Splits an interface name into its alphabetic type prefix and the
/// slot/port identifier, e.g. `Gi1/0/1` -> (`Gi`, `1/0/1`).
static INTERFACE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z-]+)\s*(\d[\d/.:]*)$").expect("Invalid regex pattern"));

/// Physical interface type used for port-channel members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    /// NX-OS style generic Ethernet.
    Ethernet,
    FastEthernet,
    GigabitEthernet,
    TenGigabitEthernet,
    TwentyFiveGigE,
    FortyGigabitEthernet,
    HundredGigE,
}

impl InterfaceType {
    /// All interface types, in model order.
    pub const ALL: [InterfaceType; 7] = [
        InterfaceType::Ethernet,
        InterfaceType::FastEthernet,
        InterfaceType::GigabitEthernet,
        InterfaceType::TenGigabitEthernet,
        InterfaceType::TwentyFiveGigE,
        InterfaceType::FortyGigabitEthernet,
        InterfaceType::HundredGigE,
    ];

    /// Returns the full interface name prefix as shown in device configuration.
    pub const fn name(&self) -> &'static str {
        match self {
            InterfaceType::Ethernet => "Ethernet",
            InterfaceType::FastEthernet => "FastEthernet",
            InterfaceType::GigabitEthernet => "GigabitEthernet",
            InterfaceType::TenGigabitEthernet => "TenGigabitEthernet",
            InterfaceType::TwentyFiveGigE => "TwentyFiveGigE",
            InterfaceType::FortyGigabitEthernet => "FortyGigabitEthernet",
            InterfaceType::HundredGigE => "HundredGigE",
        }
    }

    /// Lowercase short forms used in operational command output.
    const fn abbreviations(&self) -> &'static [&'static str] {
        match self {
            InterfaceType::Ethernet => &["e", "et", "eth"],
            InterfaceType::FastEthernet => &["fa", "fas"],
            InterfaceType::GigabitEthernet => &["gi", "gig"],
            InterfaceType::TenGigabitEthernet => &["te", "ten"],
            InterfaceType::TwentyFiveGigE => &["twe", "tf"],
            InterfaceType::FortyGigabitEthernet => &["fo", "for"],
            InterfaceType::HundredGigE => &["hu", "hun"],
        }
    }

    /// Looks up an interface type from a full or abbreviated name prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let prefix = prefix.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| {
            kind.name().eq_ignore_ascii_case(&prefix) || kind.abbreviations().contains(&prefix.as_str())
        })
    }

    /// Builds the full interface name for an identifier, e.g. `Ethernet1/1`.
    pub fn interface_name(&self, id: &str) -> String {
        format!("{}{}", self.name(), id)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InterfaceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the device spelling and the model (kebab-case) spelling
        let compact: String = s.chars().filter(|c| *c != '-').collect();
        Self::from_prefix(&compact).ok_or_else(|| ParseError::InvalidInterfaceType(s.to_string()))
    }
}

/// Expands an operational interface name to its canonical full form.
///
/// `Eth1/1` becomes `Ethernet1/1` and `Gi1/0/1` becomes `GigabitEthernet1/0/1`.
/// Names with an unknown prefix are returned unchanged.
pub fn canonical_interface_name(name: &str) -> String {
    let trimmed = name.trim();
    INTERFACE_NAME_RE
        .captures(trimmed)
        .and_then(|caps| {
            let kind = InterfaceType::from_prefix(&caps[1])?;
            Some(kind.interface_name(&caps[2]))
        })
        .unwrap_or_else(|| trimmed.to_string())
}

/// Member interface selection of a port-channel.
///
/// Exactly one interface type is selected per port-channel; the variant
/// carries the interface identifiers (`"1/0/49"`) of that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberInterfaces {
    Ethernet(Vec<String>),
    FastEthernet(Vec<String>),
    GigabitEthernet(Vec<String>),
    TenGigabitEthernet(Vec<String>),
    TwentyFiveGigE(Vec<String>),
    FortyGigabitEthernet(Vec<String>),
    HundredGigE(Vec<String>),
}

impl MemberInterfaces {
    /// Creates a member selection of the given type.
    pub fn new<I, S>(kind: InterfaceType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        match kind {
            InterfaceType::Ethernet => MemberInterfaces::Ethernet(ids),
            InterfaceType::FastEthernet => MemberInterfaces::FastEthernet(ids),
            InterfaceType::GigabitEthernet => MemberInterfaces::GigabitEthernet(ids),
            InterfaceType::TenGigabitEthernet => MemberInterfaces::TenGigabitEthernet(ids),
            InterfaceType::TwentyFiveGigE => MemberInterfaces::TwentyFiveGigE(ids),
            InterfaceType::FortyGigabitEthernet => MemberInterfaces::FortyGigabitEthernet(ids),
            InterfaceType::HundredGigE => MemberInterfaces::HundredGigE(ids),
        }
    }

    /// Returns the selected interface type.
    pub const fn interface_type(&self) -> InterfaceType {
        match self {
            MemberInterfaces::Ethernet(_) => InterfaceType::Ethernet,
            MemberInterfaces::FastEthernet(_) => InterfaceType::FastEthernet,
            MemberInterfaces::GigabitEthernet(_) => InterfaceType::GigabitEthernet,
            MemberInterfaces::TenGigabitEthernet(_) => InterfaceType::TenGigabitEthernet,
            MemberInterfaces::TwentyFiveGigE(_) => InterfaceType::TwentyFiveGigE,
            MemberInterfaces::FortyGigabitEthernet(_) => InterfaceType::FortyGigabitEthernet,
            MemberInterfaces::HundredGigE(_) => InterfaceType::HundredGigE,
        }
    }

    /// Returns the interface identifiers.
    pub fn ids(&self) -> &[String] {
        match self {
            MemberInterfaces::Ethernet(ids)
            | MemberInterfaces::FastEthernet(ids)
            | MemberInterfaces::GigabitEthernet(ids)
            | MemberInterfaces::TenGigabitEthernet(ids)
            | MemberInterfaces::TwentyFiveGigE(ids)
            | MemberInterfaces::FortyGigabitEthernet(ids)
            | MemberInterfaces::HundredGigE(ids) => ids,
        }
    }

    /// Returns the full interface names of all members.
    pub fn interface_names(&self) -> Vec<String> {
        let kind = self.interface_type();
        self.ids().iter().map(|id| kind.interface_name(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

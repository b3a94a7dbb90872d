//! VLAN ID type with validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IEEE 802.1Q VLAN identifier (1-4094).
///
/// Used as the key of per-VLAN spanning-tree state. Parsers report VLANs as
/// bare numbers, `Vlan10`, or the zero-padded `VLAN0010` form; all of them
/// parse to the same id.
///
/// # Examples
///
/// ```
/// use netfabric_types::VlanId;
///
/// let vlan: VlanId = "VLAN0010".parse().unwrap();
/// assert_eq!(vlan.as_u16(), 10);
///
/// assert!(VlanId::new(0).is_err());
/// assert!(VlanId::new(4095).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID.
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Creates a new VLAN ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the VLAN ID is not in the valid range (1-4094).
    pub const fn new(id: u16) -> Result<Self, ParseError> {
        if id >= Self::MIN && id <= Self::MAX {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let id_str = match s.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("vlan") => &s[4..],
            _ => s,
        };

        let id: u16 = id_str.parse().map_err(|_| ParseError::InvalidVlanId(0))?;

        VlanId::new(id)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_range() {
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("100".parse::<VlanId>().unwrap().as_u16(), 100);
        assert_eq!("Vlan100".parse::<VlanId>().unwrap().as_u16(), 100);
        assert_eq!("VLAN0001".parse::<VlanId>().unwrap().as_u16(), 1);
        assert!("VLANX".parse::<VlanId>().is_err());
    }

    #[test]
    fn test_json_map_key() {
        let parsed: std::collections::BTreeMap<VlanId, bool> =
            serde_json::from_str(r#"{"10": true, "20": false}"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get(&VlanId::new(10).unwrap()), Some(&true));
    }
}

//! Management address type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Management interface address of a device, as recorded in the inventory.
///
/// Inventory records usually carry the prefix length (`10.0.0.1/24`) but a
/// bare host address is accepted too. VPC keepalive endpoints only ever use
/// the host part, see [`ManagementAddress::host`].
///
/// # Examples
///
/// ```
/// use netfabric_types::ManagementAddress;
///
/// let addr: ManagementAddress = "10.10.20.5/24".parse().unwrap();
/// assert_eq!(addr.host(), "10.10.20.5");
/// assert_eq!(addr.prefix_len(), Some(24));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ManagementAddress {
    address: IpAddr,
    prefix_len: Option<u8>,
}

impl ManagementAddress {
    /// Creates a new management address.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address type
    /// (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddr, prefix_len: Option<u8>) -> Result<Self, ParseError> {
        let max_len = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if let Some(len) = prefix_len {
            if len > max_len {
                return Err(ParseError::InvalidAddress(format!(
                    "prefix length {} exceeds maximum {} for address type",
                    len, max_len
                )));
            }
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }

    /// Returns the host address.
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns the prefix length, if the inventory recorded one.
    pub const fn prefix_len(&self) -> Option<u8> {
        self.prefix_len
    }

    /// Returns the host part rendered without the prefix length.
    pub fn host(&self) -> String {
        self.address.to_string()
    }
}

impl fmt::Display for ManagementAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            Some(len) => write!(f, "{}/{}", self.address, len),
            None => write!(f, "{}", self.address),
        }
    }
}

impl FromStr for ManagementAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr_str, len_str) = match s.rsplit_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        let prefix_len = len_str
            .map(|len| {
                len.parse::<u8>()
                    .map_err(|_| ParseError::InvalidAddress(s.to_string()))
            })
            .transpose()?;

        ManagementAddress::new(address, prefix_len)
    }
}

impl TryFrom<String> for ManagementAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ManagementAddress> for String {
    fn from(addr: ManagementAddress) -> String {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_with_prefix() {
        let addr: ManagementAddress = "192.168.1.10/24".parse().unwrap();
        assert_eq!(addr.host(), "192.168.1.10");
        assert_eq!(addr.prefix_len(), Some(24));
        assert_eq!(addr.to_string(), "192.168.1.10/24");
    }

    #[test]
    fn test_parse_bare_host() {
        let addr: ManagementAddress = "10.0.0.1".parse().unwrap();
        assert_eq!(addr.prefix_len(), None);
        assert_eq!(addr.to_string(), "10.0.0.1");
    }

    #[test]
    fn test_parse_ipv6() {
        let addr: ManagementAddress = "2001:db8::10/64".parse().unwrap();
        assert!(addr.address().is_ipv6());
        assert_eq!(addr.host(), "2001:db8::10");
    }

    #[test]
    fn test_invalid_prefix_len() {
        assert!("10.0.0.1/33".parse::<ManagementAddress>().is_err());
        assert!("2001:db8::1/129".parse::<ManagementAddress>().is_err());
        assert!("10.0.0.1/abc".parse::<ManagementAddress>().is_err());
    }

    #[test]
    fn test_invalid_address() {
        assert!("not-an-ip".parse::<ManagementAddress>().is_err());
        assert!("".parse::<ManagementAddress>().is_err());
    }

    #[test]
    fn test_serde_string_form() {
        let addr: ManagementAddress = serde_json::from_str("\"172.16.0.2/16\"").unwrap();
        assert_eq!(addr.host(), "172.16.0.2");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"172.16.0.2/16\"");
    }
}

//! Closed port range (`80`, `1000-2000`) with adjacency aware merging.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token used by NSG rules for "any port".
pub const ANY_PORT: &str = "*";

/// Lowest valid port. Port 0 is reserved and never appears in a rule.
pub const MIN_PORT: u16 = 1;

/// Reasons a port range string is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortRangeError {
    #[error("empty port range")]
    Empty,
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("malformed port range '{0}'")]
    Malformed(String),
    #[error("inverted port range {lo}-{hi}")]
    Inverted { lo: u16, hi: u16 },
}

/// Contiguous range of ports, both bounds inclusive.
///
/// A single port is a range where `lo == hi`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRange {
    lo: u16,
    hi: u16,
}

impl PortRange {
    /// `1-65535`, what the wildcard `*` expands to.
    pub const FULL: PortRange = PortRange { lo: 1, hi: 65535 };

    /// Create a range from explicit bounds.
    ///
    /// # Examples
    /// ```
    /// use azure_nsg_summary::models::PortRange;
    /// assert_eq!(PortRange::new(10, 12).unwrap().to_string(), "10-12");
    /// assert!(PortRange::new(12, 10).is_err());
    /// assert!(PortRange::new(0, 10).is_err());
    /// ```
    pub fn new(lo: u16, hi: u16) -> Result<PortRange, PortRangeError> {
        if lo < MIN_PORT {
            return Err(PortRangeError::InvalidPort(lo.to_string()));
        }
        if lo > hi {
            return Err(PortRangeError::Inverted { lo, hi });
        }
        Ok(PortRange { lo, hi })
    }

    pub fn single(port: u16) -> Result<PortRange, PortRangeError> {
        PortRange::new(port, port)
    }

    pub fn lo(&self) -> u16 {
        self.lo
    }

    pub fn hi(&self) -> u16 {
        self.hi
    }

    /// Number of ports covered.
    pub fn port_count(&self) -> u32 {
        u32::from(self.hi) - u32::from(self.lo) + 1
    }

    /// True when the two ranges share a port or no port lies between them.
    pub fn is_adjacent_or_overlapping(&self, other: &PortRange) -> bool {
        // u32 so that 65535 + 1 does not wrap
        u32::from(self.lo) <= u32::from(other.hi) + 1
            && u32::from(other.lo) <= u32::from(self.hi) + 1
    }

    /// Grow `self` to the union with `other` if they touch.
    ///
    /// Returns false and leaves `self` unchanged when a gap separates them.
    pub fn try_merge(&mut self, other: &PortRange) -> bool {
        if !self.is_adjacent_or_overlapping(other) {
            return false;
        }
        self.lo = self.lo.min(other.lo);
        self.hi = self.hi.max(other.hi);
        true
    }

    pub fn contains(&self, port: u16) -> bool {
        self.lo <= port && port <= self.hi
    }

    pub fn contains_range(&self, other: &PortRange) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }
}

fn parse_port(s: &str) -> Result<u16, PortRangeError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortRangeError::InvalidPort(s.to_string()));
    }
    match s.parse::<u16>() {
        Ok(port) if port >= MIN_PORT => Ok(port),
        _ => Err(PortRangeError::InvalidPort(s.to_string())),
    }
}

impl FromStr for PortRange {
    type Err = PortRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortRangeError::Empty);
        }
        if s == ANY_PORT {
            return Ok(PortRange::FULL);
        }
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [port] => PortRange::single(parse_port(port)?),
            [lo, hi] if !lo.trim().is_empty() && !hi.trim().is_empty() => {
                PortRange::new(parse_port(lo)?, parse_port(hi)?)
            }
            _ => Err(PortRangeError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}-{}", self.lo, self.hi)
        }
    }
}

impl Serialize for PortRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PortRange {
    fn deserialize<D>(deserializer: D) -> Result<PortRange, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| de::Error::custom(format!("invalid port range '{s}': {e}")))
    }
}

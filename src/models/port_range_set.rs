//! Minimal sorted set of port ranges.

use super::{PortRange, PortRangeError};
use itertools::Itertools;
use std::fmt;

/// Sorted, fully consolidated list of [`PortRange`].
///
/// Members are ordered by lower bound and no two of them overlap or touch,
/// so the set always holds the fewest ranges covering its ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortRangeSet {
    ranges: Vec<PortRange>,
}

impl PortRangeSet {
    pub fn new() -> PortRangeSet {
        PortRangeSet { ranges: Vec::new() }
    }

    /// Insert a range and re-consolidate the whole set.
    ///
    /// # Examples
    /// ```
    /// use azure_nsg_summary::models::{PortRange, PortRangeSet};
    /// let mut set = PortRangeSet::new();
    /// set.add(PortRange::new(10, 12).unwrap());
    /// set.add(PortRange::new(13, 18).unwrap());
    /// assert_eq!(set.to_string(), "{10-18}");
    /// ```
    pub fn add(&mut self, range: PortRange) {
        self.ranges.push(range);
        // stable sort, equal lower bounds keep insertion order
        self.ranges.sort_by_key(|r| r.lo());

        let mut merged: Vec<PortRange> = Vec::with_capacity(self.ranges.len());
        let mut current = self.ranges[0];
        for next in self.ranges.iter().skip(1) {
            if !current.try_merge(next) {
                merged.push(current);
                current = *next;
            }
        }
        merged.push(current);

        self.ranges = merged;
    }

    /// Parse `token` and add it. On error the set is left as it was.
    pub fn add_str(&mut self, token: &str) -> Result<(), PortRangeError> {
        let range: PortRange = token.parse()?;
        self.add(range);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PortRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(port))
    }

    /// Total number of distinct ports covered.
    pub fn port_count(&self) -> u32 {
        self.ranges.iter().map(|r| r.port_count()).sum()
    }

    pub fn is_full(&self) -> bool {
        self.ranges
            .iter()
            .any(|r| r.contains_range(&PortRange::FULL))
    }
}

impl FromIterator<PortRange> for PortRangeSet {
    fn from_iter<I: IntoIterator<Item = PortRange>>(iter: I) -> Self {
        let mut set = PortRangeSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<PortRange> for PortRangeSet {
    fn extend<I: IntoIterator<Item = PortRange>>(&mut self, iter: I) {
        for range in iter {
            self.add(range);
        }
    }
}

impl<'a> IntoIterator for &'a PortRangeSet {
    type Item = &'a PortRange;
    type IntoIter = std::slice::Iter<'a, PortRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl fmt::Display for PortRangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.ranges.iter().join(","))
    }
}

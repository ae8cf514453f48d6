//! Domain models for the Azure NSG summary.
//!
//! This module contains the core data structures used throughout the application:
//! - [`PortRange`] - Closed port range with adjacency aware merging
//! - [`PortRangeSet`] - Minimal sorted set of port ranges
//! - [`NsgRule`] - Azure NSG security rule

mod nsg_rule;
mod port_range;
mod port_range_set;

// Re-export public types
pub use nsg_rule::{Access, Direction, NsgRule};
pub use port_range::{PortRange, PortRangeError, ANY_PORT, MIN_PORT};
pub use port_range_set::PortRangeSet;

//! NSG rule processing logic.
//!
//! This module contains business logic for processing rule data:
//! - [`filter`] - Name and type pattern filtering
//! - [`dedup`] - De-duplication and ordering of rule records
//! - [`consolidate`] - Port range consolidation per group

mod consolidate;
mod dedup;
mod filter;

// Re-export public functions
pub use consolidate::{consolidate_rules, ConsolidatedGroup, GroupBy, GroupKey};
pub use dedup::{check_for_duplicate_rules, de_duplicate_rules, sort_rules};
pub use filter::{filter_rules, RuleFilter};

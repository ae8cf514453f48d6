//! Azure CLI and Graph API interaction.
//!
//! This module handles all Azure-related operations:
//! - [`cli`] - Command execution for Azure CLI
//! - [`cache`] - Caching of NSG rule data
//! - [`graph`] - Azure Resource Graph queries
//! - [`retry`] - Growing-delay retry of Azure calls

mod cache;
mod cli;
mod graph;
mod retry;

// Re-export public types and functions
pub use cache::{default_cache_file, read_rule_cache};
pub use cli::run;
pub use graph::{run_az_cli_graph, Data};
pub use retry::Backoff;

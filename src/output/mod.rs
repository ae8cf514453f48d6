//! Output formatting for consolidated NSG port groups.
//!
//! - [`csv`] - Delimited text output
//! - [`terminal`] - Terminal output with colors

mod csv;
mod terminal;

pub use csv::{escape_field, groups_print, write_groups};
pub use terminal::{format_field, print_summary, summary_line};

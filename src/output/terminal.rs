//! Terminal output utilities.

use crate::models::Access;
use crate::processing::ConsolidatedGroup;
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());

    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// One summary line for a group, without colours.
pub fn summary_line(group: &ConsolidatedGroup) -> String {
    let key = &group.key;
    let flow = match (&key.source, &key.destination) {
        (Some(src), Some(dst)) => format!(" {src} -> {dst}"),
        _ => String::new(),
    };
    format!(
        "{nsg},{direction},{protocol},{access}{flow} rules={rules} ports={ports}",
        nsg = format_field(&key.nsg_name, 24),
        direction = format_field(key.direction, 10),
        protocol = format_field(&key.protocol, 6),
        access = format_field(key.access, 7),
        rules = group.rule_names.len(),
        ports = group.ports,
    )
}

/// Print a coloured summary of all groups to stdout.
pub fn print_summary(groups: &[ConsolidatedGroup]) {
    log::info!("#Start print_summary() {} group(s)", groups.len());

    for group in groups {
        let line = summary_line(group);
        let line = match group.key.access {
            Access::Allow => line.green(),
            Access::Deny => line.red(),
        };
        if group.ports.is_full() {
            println!("{line} {}", "ANY".on_red());
        } else {
            println!("{line}");
        }
        if group.skipped_tokens > 0 {
            println!(
                "#{}# {} malformed port token(s) skipped in '{}'",
                "NOTE".on_red(),
                group.skipped_tokens,
                group.key.nsg_name
            );
        }
    }
}

//! Delimited text output of consolidated port groups.

use crate::processing::ConsolidatedGroup;
use itertools::Itertools;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};

const HEADER: [&str; 9] = [
    "subscription_name",
    "nsg_name",
    "direction",
    "protocol",
    "access",
    "source",
    "destination",
    "rule_count",
    "ports",
];

/// Quote a field when it holds the delimiter, a quote or a line break.
///
/// Inner double quotes are doubled.
pub fn escape_field(input: &str, delimiter: char) -> String {
    let needs_quotes = input
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        let escaped = input.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        input.to_string()
    }
}

fn write_record<W: Write>(out: &mut W, fields: &[String], delimiter: char) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f, delimiter))
        .join(&delimiter.to_string());
    writeln!(out, "{}", line)
}

/// Write the header and one record per group to `out`.
pub fn write_groups<W: Write>(
    groups: &[ConsolidatedGroup],
    delimiter: char,
    out: &mut W,
) -> io::Result<()> {
    let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
    write_record(out, &header, delimiter)?;

    for group in groups {
        let key = &group.key;
        let record = vec![
            key.subscription.clone(),
            key.nsg_name.clone(),
            key.direction.to_string(),
            key.protocol.clone(),
            key.access.to_string(),
            key.source.clone().unwrap_or_else(|| "*".to_string()),
            key.destination.clone().unwrap_or_else(|| "*".to_string()),
            group.rule_names.len().to_string(),
            group.ports.to_string(),
        ];
        write_record(out, &record, delimiter)?;
    }
    out.flush()
}

/// Write the groups to `csv_file`, or to stdout when no file is given.
pub fn groups_print(
    groups: &[ConsolidatedGroup],
    delimiter: char,
    csv_file: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    match csv_file {
        Some(path) => {
            let file =
                File::create(path).map_err(|e| format!("Error creating CSV file {path}: {e}"))?;
            let mut out = BufWriter::new(file);
            write_groups(groups, delimiter, &mut out)
                .map_err(|e| format!("Error writing CSV file {path}: {e}"))?;
            log::info!("Wrote {} group(s) to {path}", groups.len());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_groups(groups, delimiter, &mut out)?;
        }
    }
    Ok(())
}

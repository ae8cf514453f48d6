//! Runtime settings read from the environment (and `.env` via dotenv).

use crate::models::{Access, Direction};
use crate::processing::GroupBy;
use std::env;
use std::error::Error;

/// Pause between graph query pages.
pub const SLEEP_MSEC: u64 = 500;

/// Settings for one report run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit cache file, `None` uses the dated default.
    pub cache_file: Option<String>,
    pub nsg_name_filter: Option<String>,
    pub rule_name_filter: Option<String>,
    pub protocol_filter: Option<String>,
    pub direction: Option<Direction>,
    pub access: Option<Access>,
    pub group_by: GroupBy,
    /// Write CSV here instead of stdout.
    pub csv_file: Option<String>,
    pub csv_delimiter: char,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cache_file: None,
            nsg_name_filter: None,
            rule_name_filter: None,
            protocol_filter: None,
            direction: None,
            access: None,
            group_by: GroupBy::ProtocolAccess,
            csv_file: None,
            csv_delimiter: ',',
        }
    }
}

impl Settings {
    /// Build settings from `NSG_*` environment variables.
    pub fn from_env() -> Result<Settings, Box<dyn Error>> {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup, blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Settings::default();

        let direction = get("NSG_DIRECTION")
            .map(|v| v.parse::<Direction>())
            .transpose()?;
        let access = get("NSG_ACCESS").map(|v| v.parse::<Access>()).transpose()?;
        let group_by = get("NSG_GROUP_BY")
            .map(|v| v.parse::<GroupBy>())
            .transpose()?
            .unwrap_or(defaults.group_by);
        let csv_delimiter = match get("NSG_CSV_DELIMITER") {
            None => defaults.csv_delimiter,
            Some(v) => parse_delimiter(&v)?,
        };

        let settings = Settings {
            cache_file: get("NSG_CACHE_FILE"),
            nsg_name_filter: get("NSG_NAME_FILTER"),
            rule_name_filter: get("NSG_RULE_FILTER"),
            protocol_filter: get("NSG_PROTOCOL_FILTER"),
            direction,
            access,
            group_by,
            csv_file: get("NSG_CSV_FILE"),
            csv_delimiter,
        };
        log::debug!("settings={:?}", settings);
        Ok(settings)
    }
}

/// Single character delimiter, `tab` and `\t` mean a tab.
fn parse_delimiter(value: &str) -> Result<char, Box<dyn Error>> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '"' => Ok(c),
        _ => Err(format!(
            "NSG_CSV_DELIMITER must be a single character other than '\"', got '{value}'"
        )
        .into()),
    }
}

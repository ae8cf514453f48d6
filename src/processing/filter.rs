//! Name and type pattern filtering of NSG rules.

use crate::azure::Data;
use crate::config::Settings;
use crate::models::{Access, Direction, NsgRule};
use regex::{Regex, RegexBuilder};
use std::error::Error;

/// Criteria a rule must meet to be reported. Unset criteria match everything.
#[derive(Debug, Default, Clone)]
pub struct RuleFilter {
    pub nsg_name: Option<Regex>,
    pub rule_name: Option<Regex>,
    pub protocol: Option<Regex>,
    pub direction: Option<Direction>,
    pub access: Option<Access>,
}

/// Compile a case-insensitive pattern.
fn pattern(value: Option<&str>, what: &str) -> Result<Option<Regex>, Box<dyn Error>> {
    value
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| -> Box<dyn Error> {
                    format!("Invalid {what} pattern '{p}': {e}").into()
                })
        })
        .transpose()
}

impl RuleFilter {
    pub fn from_settings(settings: &Settings) -> Result<RuleFilter, Box<dyn Error>> {
        Ok(RuleFilter {
            nsg_name: pattern(settings.nsg_name_filter.as_deref(), "NSG name")?,
            rule_name: pattern(settings.rule_name_filter.as_deref(), "rule name")?,
            protocol: pattern(settings.protocol_filter.as_deref(), "protocol")?,
            direction: settings.direction,
            access: settings.access,
        })
    }

    pub fn matches(&self, rule: &NsgRule) -> bool {
        let re_ok =
            |re: &Option<Regex>, value: &str| re.as_ref().map_or(true, |re| re.is_match(value));

        re_ok(&self.nsg_name, &rule.nsg_name)
            && re_ok(&self.rule_name, &rule.rule_name)
            && re_ok(&self.protocol, &rule.protocol)
            && self.direction.map_or(true, |d| d == rule.direction)
            && self.access.map_or(true, |a| a == rule.access)
    }
}

/// Keep only the rules accepted by `filter`.
pub fn filter_rules(mut data: Data, filter: &RuleFilter) -> Data {
    let original_count = data.data.len();

    data.data.retain(|rule| {
        let keep = filter.matches(rule);
        if !keep {
            log::trace!(
                "Filtered out rule '{}' of NSG '{}'",
                rule.rule_name,
                rule.nsg_name
            );
        }
        keep
    });

    let filtered_count = original_count - data.data.len();
    if filtered_count > 0 {
        log::info!(
            "Filtered out {} of {} rules, {} remain",
            filtered_count,
            original_count,
            data.data.len()
        );
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::read_rule_cache;

    const CACHE: &str = "src/tests/test_data/nsg_test_cache_01.json";

    #[test]
    fn test_no_filter_keeps_all() {
        let data = read_rule_cache(Some(CACHE)).unwrap();
        let count = data.data.len();
        let data = filter_rules(data, &RuleFilter::default());
        assert_eq!(data.data.len(), count);
    }

    #[test]
    fn test_nsg_name_pattern_case_insensitive() {
        let settings = Settings {
            nsg_name_filter: Some("^APP-".to_string()),
            ..Default::default()
        };
        let filter = RuleFilter::from_settings(&settings).unwrap();
        let data = filter_rules(read_rule_cache(Some(CACHE)).unwrap(), &filter);
        assert!(!data.data.is_empty());
        assert!(data.data.iter().all(|r| r.nsg_name == "app-nsg"));
    }

    #[test]
    fn test_direction_access_and_protocol() {
        let settings = Settings {
            protocol_filter: Some("^tcp$".to_string()),
            direction: Some(Direction::Inbound),
            access: Some(Access::Deny),
            ..Default::default()
        };
        let filter = RuleFilter::from_settings(&settings).unwrap();
        let data = filter_rules(read_rule_cache(Some(CACHE)).unwrap(), &filter);
        assert_eq!(data.data.len(), 1);
        assert_eq!(data.data[0].rule_name, "deny-telnet");
    }

    #[test]
    fn test_invalid_pattern() {
        let settings = Settings {
            rule_name_filter: Some("(unclosed".to_string()),
            ..Default::default()
        };
        let err = RuleFilter::from_settings(&settings).unwrap_err();
        assert!(err.to_string().starts_with("Invalid rule name pattern"));
    }
}

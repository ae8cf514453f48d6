//! Consolidation of rule port ranges per group.
//!
//! Rules are scanned in order and every destination port token is added to
//! the [`PortRangeSet`] of the rule's group. Groups are always scoped to one
//! NSG and direction; within that scope they are keyed by protocol and
//! access, optionally also by source and destination.

use crate::models::{Access, Direction, NsgRule, PortRangeSet};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fields that split rules into separate port sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// (protocol, access)
    ProtocolAccess,
    /// (source, destination, protocol, access)
    Flow,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protocol" | "protocol_access" | "protocol-access" => Ok(GroupBy::ProtocolAccess),
            "flow" => Ok(GroupBy::Flow),
            other => Err(format!(
                "Unknown grouping '{other}', expected 'protocol' or 'flow'"
            )),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::ProtocolAccess => write!(f, "protocol"),
            GroupBy::Flow => write!(f, "flow"),
        }
    }
}

/// Identity of one consolidated port set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub subscription: String,
    pub nsg_name: String,
    pub direction: Direction,
    /// Only set for [`GroupBy::Flow`].
    pub source: Option<String>,
    /// Only set for [`GroupBy::Flow`].
    pub destination: Option<String>,
    pub protocol: String,
    pub access: Access,
}

impl GroupKey {
    pub fn for_rule(rule: &NsgRule, group_by: GroupBy) -> GroupKey {
        let (source, destination) = match group_by {
            GroupBy::ProtocolAccess => (None, None),
            GroupBy::Flow => (Some(rule.source_label()), Some(rule.destination_label())),
        };
        GroupKey {
            subscription: rule.subscription_label().to_string(),
            nsg_name: rule.nsg_name.clone(),
            direction: rule.direction,
            source,
            destination,
            protocol: rule.protocol.clone(),
            access: rule.access,
        }
    }
}

/// Port set built for one [`GroupKey`].
#[derive(Debug, Clone)]
pub struct ConsolidatedGroup {
    pub key: GroupKey,
    pub ports: PortRangeSet,
    /// Names of the rules that contributed, in scan order.
    pub rule_names: Vec<String>,
    /// Port tokens that failed to parse and were left out.
    pub skipped_tokens: usize,
}

impl ConsolidatedGroup {
    fn new(key: GroupKey) -> ConsolidatedGroup {
        ConsolidatedGroup {
            key,
            ports: PortRangeSet::new(),
            rule_names: Vec::new(),
            skipped_tokens: 0,
        }
    }

    /// Add every destination port of `rule`, skipping malformed tokens.
    fn add_rule(&mut self, rule: &NsgRule) {
        self.rule_names.push(rule.rule_name.clone());

        let tokens = rule.destination_port_tokens();
        if tokens.is_empty() {
            log::warn!(
                "Rule '{}' in NSG '{}' has no destination ports",
                rule.rule_name,
                rule.nsg_name
            );
        }
        for token in tokens {
            if let Err(e) = self.ports.add_str(token) {
                log::warn!(
                    "Skipping port '{}' of rule '{}' in NSG '{}': {}",
                    token,
                    rule.rule_name,
                    rule.nsg_name,
                    e
                );
                self.skipped_tokens += 1;
            }
        }
    }
}

/// Build one consolidated port set per group, sorted by key.
///
/// Empty input gives an empty result.
pub fn consolidate_rules(rules: &[NsgRule], group_by: GroupBy) -> Vec<ConsolidatedGroup> {
    let mut groups: BTreeMap<GroupKey, ConsolidatedGroup> = BTreeMap::new();

    for rule in rules {
        let key = GroupKey::for_rule(rule, group_by);

        match groups.get_mut(&key) {
            Some(group) => group.add_rule(rule),
            None => {
                let mut group = ConsolidatedGroup::new(key.clone());
                group.add_rule(rule);
                groups.insert(key, group);
            }
        }
    }

    log::info!(
        "Consolidated {} rules into {} groups by {}",
        rules.len(),
        groups.len(),
        group_by
    );
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, protocol: &str, access: Access, ports: &[&str]) -> NsgRule {
        NsgRule {
            nsg_name: "web-nsg".to_string(),
            rule_name: name.to_string(),
            protocol: protocol.to_string(),
            access,
            destination_port_ranges: Some(ports.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_by_parse() {
        assert_eq!("Protocol".parse::<GroupBy>().unwrap(), GroupBy::ProtocolAccess);
        assert_eq!("flow".parse::<GroupBy>().unwrap(), GroupBy::Flow);
        assert!("port".parse::<GroupBy>().is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate_rules(&[], GroupBy::ProtocolAccess).is_empty());
    }

    #[test]
    fn test_consolidate_protocol_access() {
        let rules = vec![
            rule("web", "Tcp", Access::Allow, &["80", "443"]),
            rule("alt-web", "Tcp", Access::Allow, &["8000-8080", "81"]),
            rule("dns", "Udp", Access::Allow, &["53"]),
            rule("block", "Tcp", Access::Deny, &["23"]),
        ];
        let groups = consolidate_rules(&rules, GroupBy::ProtocolAccess);
        assert_eq!(groups.len(), 3);

        let tcp_allow = groups
            .iter()
            .find(|g| g.key.protocol == "Tcp" && g.key.access == Access::Allow)
            .unwrap();
        assert_eq!(tcp_allow.ports.to_string(), "{80-81,443,8000-8080}");
        assert_eq!(tcp_allow.rule_names, vec!["web", "alt-web"]);
        assert!(tcp_allow.key.source.is_none());

        // Allow sorts before Deny
        assert_eq!(groups[0].key.access, Access::Allow);
        assert_eq!(groups[1].key.access, Access::Deny);
    }

    #[test]
    fn test_malformed_port_is_skipped() {
        let rules = vec![
            rule("ssh", "Tcp", Access::Allow, &["22"]),
            rule("broken", "Tcp", Access::Allow, &["80-abc", "443", "500-400"]),
        ];
        let groups = consolidate_rules(&rules, GroupBy::ProtocolAccess);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ports.to_string(), "{22,443}");
        assert_eq!(groups[0].skipped_tokens, 2);
        assert_eq!(groups[0].rule_names.len(), 2);
    }

    #[test]
    fn test_wildcard_absorbs_group() {
        let rules = vec![
            rule("web", "Tcp", Access::Allow, &["80", "443"]),
            rule("any", "Tcp", Access::Allow, &["*"]),
        ];
        let groups = consolidate_rules(&rules, GroupBy::ProtocolAccess);
        assert_eq!(groups[0].ports.to_string(), "{1-65535}");
    }

    #[test]
    fn test_flow_grouping_splits_by_address() {
        let mut from_lan = rule("lan-web", "Tcp", Access::Allow, &["80"]);
        from_lan.source_address_prefix = Some("10.0.0.0/8".to_string());
        let mut from_internet = rule("inet-web", "Tcp", Access::Allow, &["443"]);
        from_internet.source_address_prefix = Some("Internet".to_string());

        let rules = vec![from_lan, from_internet];
        assert_eq!(consolidate_rules(&rules, GroupBy::ProtocolAccess).len(), 1);

        let groups = consolidate_rules(&rules, GroupBy::Flow);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.source.as_deref(), Some("10.0.0.0/8"));
        assert_eq!(groups[0].key.destination.as_deref(), Some("*"));
        assert_eq!(groups[1].ports.to_string(), "{443}");
    }

    #[test]
    fn test_direction_and_nsg_are_separate_scopes() {
        let inbound = rule("in", "Tcp", Access::Allow, &["22"]);
        let mut outbound = rule("out", "Tcp", Access::Allow, &["23"]);
        outbound.direction = Direction::Outbound;
        let mut other_nsg = rule("other", "Tcp", Access::Allow, &["24"]);
        other_nsg.nsg_name = "db-nsg".to_string();

        let groups = consolidate_rules(&[inbound, outbound, other_nsg], GroupBy::ProtocolAccess);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key.nsg_name, "db-nsg");
    }
}

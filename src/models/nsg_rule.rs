//! Azure NSG security rule data model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Traffic direction a rule applies to.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Access decision of a rule.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    Allow,
    Deny,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "Inbound"),
            Direction::Outbound => write!(f, "Outbound"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbound" | "in" => Ok(Direction::Inbound),
            "outbound" | "out" => Ok(Direction::Outbound),
            other => Err(format!("Unknown direction '{other}'")),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Allow => write!(f, "Allow"),
            Access::Deny => write!(f, "Deny"),
        }
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Access::Allow),
            "deny" => Ok(Access::Deny),
            other => Err(format!("Unknown access '{other}'")),
        }
    }
}

/// One security rule of a Network Security Group, flattened by the graph query.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NsgRule {
    /// Azure subscription ID.
    pub subscription_id: String,
    /// Azure subscription display name.
    pub subscription_name: Option<String>,
    pub resource_group: String,
    /// Name of the Network Security Group owning the rule.
    pub nsg_name: String,
    /// Azure region location.
    pub location: String,
    pub rule_name: String,
    pub priority: u32,
    pub direction: Direction,
    pub access: Access,
    /// `Tcp`, `Udp`, `Icmp`, `*` ...
    pub protocol: String,
    pub source_address_prefix: Option<String>,
    pub source_address_prefixes: Option<Vec<String>>,
    pub destination_address_prefix: Option<String>,
    pub destination_address_prefixes: Option<Vec<String>>,
    /// Single port token, `*` for any port. Empty when the list form is used.
    pub destination_port_range: Option<String>,
    pub destination_port_ranges: Option<Vec<String>>,
    /// Record index from source (for tracking/debugging).
    #[serde(default)]
    pub src_index: usize,
    /// Block ID from paginated graph query results.
    #[serde(default)]
    pub block_id: usize,
}

impl NsgRule {
    /// All non-empty destination port tokens from the single and list forms.
    pub fn destination_port_tokens(&self) -> Vec<&str> {
        self.destination_port_range
            .iter()
            .map(|s| s.as_str())
            .chain(
                self.destination_port_ranges
                    .iter()
                    .flatten()
                    .map(|s| s.as_str()),
            )
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn source_label(&self) -> String {
        address_label(
            self.source_address_prefix.as_deref(),
            self.source_address_prefixes.as_deref(),
        )
    }

    pub fn destination_label(&self) -> String {
        address_label(
            self.destination_address_prefix.as_deref(),
            self.destination_address_prefixes.as_deref(),
        )
    }

    pub fn subscription_label(&self) -> &str {
        self.subscription_name
            .as_deref()
            .unwrap_or(&self.subscription_id)
    }
}

/// Prefer the list form, fall back to the single prefix, else `*`.
fn address_label(prefix: Option<&str>, prefixes: Option<&[String]>) -> String {
    match prefixes {
        Some(list) if !list.is_empty() => {
            let mut list = list.to_vec();
            list.sort();
            list.join(",")
        }
        _ => match prefix.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => "*".to_string(),
        },
    }
}

impl Default for NsgRule {
    fn default() -> Self {
        NsgRule {
            subscription_id: "blank".to_string(),
            subscription_name: None,
            resource_group: "blank".to_string(),
            nsg_name: "blank".to_string(),
            location: "blank".to_string(),
            rule_name: "".to_string(),
            priority: 4096,
            direction: Direction::Inbound,
            access: Access::Allow,
            protocol: "*".to_string(),
            source_address_prefix: None,
            source_address_prefixes: None,
            destination_address_prefix: None,
            destination_address_prefixes: None,
            destination_port_range: None,
            destination_port_ranges: None,
            src_index: 0,
            block_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_port_tokens() {
        let rule = NsgRule {
            destination_port_range: Some("".to_string()),
            destination_port_ranges: Some(vec![
                "443".to_string(),
                " 8000-8080 ".to_string(),
                "".to_string(),
            ]),
            ..Default::default()
        };
        assert_eq!(rule.destination_port_tokens(), vec!["443", "8000-8080"]);

        let any = NsgRule {
            destination_port_range: Some("*".to_string()),
            ..Default::default()
        };
        assert_eq!(any.destination_port_tokens(), vec!["*"]);
        assert!(NsgRule::default().destination_port_tokens().is_empty());
    }

    #[test]
    fn test_address_labels() {
        let rule = NsgRule {
            source_address_prefix: Some("".to_string()),
            source_address_prefixes: Some(vec![
                "10.2.0.0/16".to_string(),
                "10.1.0.0/16".to_string(),
            ]),
            destination_address_prefix: Some("VirtualNetwork".to_string()),
            ..Default::default()
        };
        assert_eq!(rule.source_label(), "10.1.0.0/16,10.2.0.0/16");
        assert_eq!(rule.destination_label(), "VirtualNetwork");
        assert_eq!(NsgRule::default().source_label(), "*");
    }

    #[test]
    fn test_direction_access_parse() {
        assert_eq!("inbound".parse::<Direction>().unwrap(), Direction::Inbound);
        assert_eq!("Out".parse::<Direction>().unwrap(), Direction::Outbound);
        assert_eq!("DENY".parse::<Access>().unwrap(), Access::Deny);
        assert!("sideways".parse::<Direction>().is_err());
        assert!("maybe".parse::<Access>().is_err());
    }

    #[test]
    fn test_deserialize_graph_row() {
        let json = r#"{
            "subscription_id": "sub-1",
            "subscription_name": "prod",
            "resource_group": "rg-net",
            "nsg_name": "web-nsg",
            "location": "australiaeast",
            "rule_name": "allow-web",
            "priority": 100,
            "direction": "Inbound",
            "access": "Allow",
            "protocol": "Tcp",
            "source_address_prefix": "*",
            "source_address_prefixes": [],
            "destination_address_prefix": "*",
            "destination_address_prefixes": [],
            "destination_port_range": "",
            "destination_port_ranges": ["80", "443"]
        }"#;
        let rule: NsgRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.access, Access::Allow);
        assert_eq!(rule.destination_port_tokens(), vec!["80", "443"]);
        assert_eq!(rule.src_index, 0);
        assert_eq!(rule.subscription_label(), "prod");
    }
}

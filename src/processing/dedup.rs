//! Rule de-duplication and ordering.
//!
//! Paginated graph results can return the same rule twice.

use crate::azure::Data;
use crate::models::NsgRule;
use std::collections::HashSet;
use std::error::Error;

/// Sort rules the way NSGs evaluate them: per NSG and direction, by priority.
pub fn sort_rules(rules: &mut [NsgRule]) {
    rules.sort_by(|a, b| {
        a.subscription_id
            .cmp(&b.subscription_id)
            .then_with(|| a.nsg_name.cmp(&b.nsg_name))
            .then_with(|| a.resource_group.cmp(&b.resource_group))
            .then_with(|| a.direction.cmp(&b.direction))
            .then_with(|| a.priority.cmp(&b.priority))
    });
}

fn rule_key(r: &NsgRule) -> (String, String, String, String) {
    (
        r.subscription_id.clone(),
        r.resource_group.clone(),
        r.nsg_name.clone(),
        r.rule_name.clone(),
    )
}

/// De-duplicate rules by subscription, resource group, NSG and rule name.
///
/// The surviving rules are returned in evaluation order (see [`sort_rules`]).
pub fn de_duplicate_rules(mut data: Data) -> Result<Data, Box<dyn Error>> {
    let original_count = data.data.len();

    // Dedup data.data - must be sorted first
    data.data.sort_by_key(rule_key);
    data.data.dedup_by_key(|r| rule_key(r));
    sort_rules(&mut data.data);

    let removed = original_count - data.data.len();
    if removed > 0 {
        log::info!("Removed {removed} duplicate rule record(s)");
    }
    Ok(data)
}

/// Return an error naming the first duplicate rule.
pub fn check_for_duplicate_rules(data: &Data) -> Result<(), Box<dyn Error>> {
    let mut seen = HashSet::new();

    for rule in data.data.iter() {
        if !seen.insert(rule_key(rule)) {
            return Err(format!(
                "Duplicate rule found: '{}' in NSG '{}' ({})",
                rule.rule_name, rule.nsg_name, rule.resource_group
            )
            .into());
        }
    }
    Ok(())
}

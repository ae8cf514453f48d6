// cargo watch -x 'fmt' -x 'run'

pub mod azure;
pub mod config;
pub mod models;
pub mod output;
pub mod processing;

use azure::Data;
use config::Settings;
use processing::{ConsolidatedGroup, RuleFilter};
use std::error::Error;

pub use processing::{check_for_duplicate_rules, de_duplicate_rules};

/// Read NSG rules (cache or az cli graph) in evaluation order.
pub fn get_sorted_rules(cache_file: Option<&str>) -> Result<Data, Box<dyn Error>> {
    let mut data = azure::read_rule_cache(cache_file)?;
    processing::sort_rules(&mut data.data);
    Ok(data)
}

/// Load, filter and de-duplicate rules, then consolidate their ports.
pub fn build_report(settings: &Settings) -> Result<Vec<ConsolidatedGroup>, Box<dyn Error>> {
    let filter = RuleFilter::from_settings(settings)?;

    // unsorted, de_duplicate_rules leaves the rules in evaluation order
    let data = azure::read_rule_cache(settings.cache_file.as_deref())?;
    log::info!("# Got rule count = {} == {}", data.count, data.data.len());

    let data = processing::filter_rules(data, &filter);
    let data = de_duplicate_rules(data)?;
    check_for_duplicate_rules(&data)?;

    Ok(processing::consolidate_rules(&data.data, settings.group_by))
}

//! Azure Resource Graph query execution.
//!
//! Handles querying Azure Resource Graph for NSG security rules.

use super::cli;
use super::retry::Backoff;
use crate::config;
use crate::models::NsgRule;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Rows requested per graph page.
const PAGE_SIZE: u32 = 200;

/// Azure Graph query flattening every NSG into one row per security rule.
const NSG_RULE_QUERY: &str = r#"resources
        | where type == "microsoft.network/networksecuritygroups"
        | mv-expand rule = properties.securityRules
        | project subscription_id=subscriptionId
                ,resource_group=resourceGroup
                ,nsg_name=name
                ,location=location
                ,rule_name=tostring(rule.name)
                ,priority=toint(rule.properties.priority)
                ,direction=tostring(rule.properties.direction)
                ,access=tostring(rule.properties.access)
                ,protocol=tostring(rule.properties.protocol)
                ,source_address_prefix=tostring(rule.properties.sourceAddressPrefix)
                ,source_address_prefixes=rule.properties.sourceAddressPrefixes
                ,destination_address_prefix=tostring(rule.properties.destinationAddressPrefix)
                ,destination_address_prefixes=rule.properties.destinationAddressPrefixes
                ,destination_port_range=tostring(rule.properties.destinationPortRange)
                ,destination_port_ranges=rule.properties.destinationPortRanges
        | where isnotempty(rule_name)
        | join kind=leftouter (
            resourcecontainers
                | where type == "microsoft.resources/subscriptions"
                | project subscription_id=subscriptionId, subscription_name=name
            ) on subscription_id
        | project subscription_id, subscription_name, resource_group, nsg_name, location, rule_name, priority, direction, access, protocol, source_address_prefix, source_address_prefixes, destination_address_prefix, destination_address_prefixes, destination_port_range, destination_port_ranges
        | sort by nsg_name asc, priority asc"#;

/// Response data from Azure Graph query.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Data {
    /// Rules returned.
    pub data: Vec<NsgRule>,
    /// Token for pagination (if more results available).
    pub skip_token: Option<String>,
    /// Total number of records matching the query.
    pub total_records: Option<u32>,
    /// Count of records in this response.
    pub count: i32,
}

/// Execute the Resource Graph query for all NSG rules.
///
/// Pages are followed through skip tokens, each page fetch is retried with
/// [`Backoff`]. Running out of retry budget aborts the whole query.
pub fn run_az_cli_graph() -> Result<Data, Box<dyn Error>> {
    let backoff = Backoff::default();
    let mut data: Data = Default::default();
    let mut skip_token_param: String = String::new();
    let mut count_blocks_returned = 0;

    while skip_token_param != "--skip-token null" {
        let cmd = format!(
            "az graph query --first {PAGE_SIZE} {skip_token_param} -q '{NSG_RULE_QUERY}' --output json"
        );
        let output = backoff.retry(&format!("graph block#{count_blocks_returned}"), || {
            cli::run(&cmd)
        })?;

        let json_parsed = parse_block(&output, count_blocks_returned)?;

        let skip_token_new = format!(
            "--skip-token {}",
            json_parsed.skip_token.as_deref().unwrap_or("null")
        );
        if skip_token_new == skip_token_param {
            return Err("Skip token not unique - possible infinite loop".into());
        }
        skip_token_param = skip_token_new;

        let count = json_parsed.count;
        data.count += count;
        if let Some(block_records) = json_parsed.total_records {
            data.total_records = Some(block_records);
        }
        data.data
            .extend(json_parsed.data.into_iter().enumerate().map(|(i, mut r)| {
                r.src_index = i;
                r.block_id = count_blocks_returned;
                r
            }));

        log::info!(
            "got block#{count_blocks_returned:2} record_count=+{count:3} => {total:4} more={more}",
            total = data.count,
            more = skip_token_param != "--skip-token null",
        );

        // Rate limiting pause
        std::thread::sleep(std::time::Duration::from_millis(config::SLEEP_MSEC));
        count_blocks_returned += 1;
    }

    check_record_count(&data)?;
    log::info!(
        "Got {} NSG rules in {count_blocks_returned} block(s) from az graph query",
        data.data.len()
    );

    Ok(data)
}

/// The summed page counts must match the rows collected. A negative count is
/// a mismatch too.
fn check_record_count(data: &Data) -> Result<(), Box<dyn Error>> {
    match usize::try_from(data.count) {
        Ok(count) if count == data.data.len() => Ok(()),
        _ => Err(format!(
            "Record count mismatch: count={} != data.len()={}",
            data.count,
            data.data.len()
        )
        .into()),
    }
}

/// Decode one page of graph output, reporting the JSON path on failure.
fn parse_block(output: &str, block: usize) -> Result<Data, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        format!(
            "Error parsing JSON block {}: path={} error={}",
            block,
            e.path(),
            e
        )
        .into()
    })
}

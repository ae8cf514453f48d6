//! Cache management for NSG rule data.
//!
//! Avoids repeated Azure Graph API calls within the same day.

use super::graph::{run_az_cli_graph, Data};
use std::error::Error;
use std::path::Path;

/// Default cache file name for the current day (Auckland time).
pub fn default_cache_file() -> String {
    let now = chrono::Utc::now().with_timezone(&chrono_tz::Pacific::Auckland);
    format!("nsg_cache_{}.json", now.format("%Y-%m-%d"))
}

/// Read NSG rule data from cache file, or fetch from Azure if cache doesn't exist.
///
/// # Arguments
/// * `cache_file` - Optional path to a specific cache file. If None, uses default naming.
///
/// # Returns
/// * `Ok(Data)` - The rule data from cache or Azure
/// * `Err` - If cache file specified but doesn't exist, or Azure query fails
pub fn read_rule_cache(cache_file: Option<&str>) -> Result<Data, Box<dyn Error>> {
    let cache_file = match cache_file {
        Some(file) => {
            if !Path::new(file).exists() {
                return Err(format!("Cache file does not exist: {file}").into());
            }
            log::info!("Using provided cache file: {file}");
            file.to_string()
        }
        None => default_cache_file(),
    };

    let data = match std::fs::read_to_string(&cache_file) {
        Ok(json) => {
            log::info!("Reading from cache file: {cache_file}");
            let mut deserializer = serde_json::Deserializer::from_str(&json);
            serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
                format!(
                    "Error parsing cache JSON {cache_file}: path={} error={}",
                    e.path(),
                    e
                )
            })?
        }
        Err(_) => {
            log::warn!("Cache file not found: {cache_file}");
            let data = run_az_cli_graph()?;

            let json =
                serde_json::to_string(&data).map_err(|e| format!("Error serializing JSON: {e}"))?;
            log::warn!("Writing data to cache file: {cache_file}");
            std::fs::write(&cache_file, json)
                .map_err(|e| format!("Error writing cache file {cache_file}: {e}"))?;
            data
        }
    };

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rule_cache() {
        let data = read_rule_cache(Some("src/tests/test_data/nsg_test_cache_01.json"))
            .expect("Error reading rule cache");
        assert_eq!(data.data.len(), 12, "Expected 12 rules in test sample");
        assert_eq!(data.data[0].nsg_name, "app-nsg", "Wrong nsg from test sample.");
        assert_eq!(data.total_records, Some(12));
        assert_eq!(data.count, 12);
    }

    #[test]
    fn test_read_rule_cache_missing_file() {
        let err = read_rule_cache(Some("src/tests/test_data/does_not_exist.json")).unwrap_err();
        assert!(err.to_string().starts_with("Cache file does not exist"));
    }

    #[test]
    fn test_read_rule_cache_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"count": 1, "data": [{"nsg_name": 7}]}"#).unwrap();
        let err = read_rule_cache(path.to_str()).unwrap_err().to_string();
        assert!(err.contains("data[0].nsg_name"), "{err}");
    }

    #[test]
    fn test_default_cache_file_name() {
        let name = default_cache_file();
        assert!(name.starts_with("nsg_cache_20"));
        assert!(name.ends_with(".json"));
    }
}

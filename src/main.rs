use azure_nsg_summary::build_report;
use azure_nsg_summary::config::Settings;
use azure_nsg_summary::output::{groups_print, print_summary};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).expect("Error initializing log4rs");
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let settings = Settings::from_env()?;
    let groups = build_report(&settings)?;

    if settings.csv_file.is_some() {
        print_summary(&groups);
    }
    groups_print(&groups, settings.csv_delimiter, settings.csv_file.as_deref())?;

    log::info!("#End main() {} group(s) reported", groups.len());
    Ok(())
}

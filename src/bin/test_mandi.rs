use crop_advisor::config::Settings;
use crop_advisor::services::mandi::{MandiClient, MarketPriceAggregator};
use dotenv::dotenv;
use env_logger;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), crop_advisor::BoxError> {
    dotenv().ok();
    env_logger::init();

    info!("Testing data.gov.in mandi price fetching...");

    let settings = Settings::from_env();
    let client = MandiClient::new(
        &settings.data_gov_api_key,
        &settings.mandi_resource_id,
        &settings.data_gov_base_url,
    );
    let aggregator = MarketPriceAggregator::new(client);

    let snapshot = aggregator.fetch("turmeric", None, None, 10).await;
    if snapshot.success {
        info!(
            "SUCCESS: {} mandis found, avg modal price {}",
            snapshot.total_mandis_found, snapshot.current_price_avg
        );
    } else {
        error!("Fell back to offline data: {:?}", snapshot.error);
    }

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

use dotenv::dotenv;
use env_logger;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use crop_advisor::config::Settings;
use crop_advisor::routes;
use crop_advisor::services::classifier::ModelArtifacts;
use crop_advisor::services::mandi::{MandiClient, MarketPriceAggregator};
use crop_advisor::services::recommend::RecommendationEngine;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env();
    info!("Using PORT: {}", settings.port);

    // Model artifacts are optional: without them the engine runs in a
    // degraded no-recommendation mode instead of refusing to start.
    let engine = match ModelArtifacts::load(&settings.model_path, &settings.encoders_path) {
        Ok(artifacts) => {
            info!("ML model artifacts loaded successfully");
            RecommendationEngine::from_artifacts(artifacts)
        }
        Err(e) => {
            warn!("Model artifacts unavailable, recommendations disabled: {}", e);
            RecommendationEngine::unavailable()
        }
    };

    let client = MandiClient::new(
        &settings.data_gov_api_key,
        &settings.mandi_resource_id,
        &settings.data_gov_base_url,
    );
    let aggregator = MarketPriceAggregator::new(client);

    // Bind to 0.0.0.0 for container deployments
    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    // Set up routes
    let api = routes::routes(Arc::new(engine), Arc::new(aggregator)).with(cors);
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}

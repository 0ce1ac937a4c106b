use crop_advisor::config::Settings;
use crop_advisor::models::FarmProfile;
use crop_advisor::services::classifier::ModelArtifacts;
use crop_advisor::services::recommend::RecommendationEngine;
use dotenv::dotenv;
use env_logger;
use log::info;

fn main() -> Result<(), crop_advisor::BoxError> {
    dotenv().ok();
    env_logger::init();

    info!("Testing crop recommendation with the demo profile...");

    let settings = Settings::from_env();
    let artifacts = ModelArtifacts::load(&settings.model_path, &settings.encoders_path)?;
    let engine = RecommendationEngine::from_artifacts(artifacts);

    let recommendations = engine.recommend(&FarmProfile::demo(), 3);
    info!("Got {} recommendations", recommendations.len());
    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}

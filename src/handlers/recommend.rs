// src/handlers/recommend.rs
use log::info;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::FarmProfile;
use crate::services::recommend::RecommendationEngine;

const DEFAULT_TOP_K: usize = 3;
const MAX_TOP_K: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub top_k: Option<usize>,
}

/// POST /api/v1/recommend — body is a farm profile; an empty payload gets
/// the demo profile so the endpoint stays usable before any farm is set up.
pub async fn post_recommend(
    query: RecommendQuery,
    body: Value,
    engine: Arc<RecommendationEngine>,
) -> Result<Json, Rejection> {
    info!("Handling crop recommendation request.");

    let profile: FarmProfile = if body.as_object().map_or(true, |obj| obj.is_empty()) {
        info!("No profile supplied, using demo defaults");
        FarmProfile::demo()
    } else {
        serde_json::from_value(body)
            .map_err(|e| warp::reject::custom(ApiError::new(format!("Invalid profile: {}", e))))?
    };

    let top_k = query.top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K);
    let recommendations = engine.recommend(&profile, top_k);

    Ok(warp::reply::json(&serde_json::json!({
        "recommendations": recommendations,
    })))
}

// src/handlers/market.rs
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::config::SUPPORTED_CROPS;
use crate::services::mandi::MarketPriceAggregator;

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub crop: String,
    pub state: Option<String>,
    pub district: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub crop: String,
    pub days: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BestMandisQuery {
    pub crop: String,
    pub state: Option<String>,
}

/// GET /api/v1/market/prices?crop=tulsi&state=Maharashtra
pub async fn get_market_prices(
    query: PricesQuery,
    aggregator: Arc<MarketPriceAggregator>,
) -> Result<Json, Rejection> {
    info!("Handling market price request for crop {}", query.crop);

    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let snapshot = aggregator
        .fetch(
            &query.crop,
            query.state.as_deref(),
            query.district.as_deref(),
            limit,
        )
        .await;

    Ok(warp::reply::json(&snapshot))
}

/// GET /api/v1/market/prices/history?crop=turmeric&days=30
pub async fn get_price_history(
    query: HistoryQuery,
    aggregator: Arc<MarketPriceAggregator>,
) -> Result<Json, Rejection> {
    info!("Handling price history request for crop {}", query.crop);

    let days = query.days.unwrap_or(30).clamp(7, 90);
    let history = aggregator.history(&query.crop, days).await;

    Ok(warp::reply::json(&history))
}

/// GET /api/v1/market/best-mandis?crop=ashwagandha
pub async fn get_best_mandis(
    query: BestMandisQuery,
    aggregator: Arc<MarketPriceAggregator>,
) -> Result<Json, Rejection> {
    info!("Handling best-mandis request for crop {}", query.crop);

    let view = aggregator
        .best_mandis(&query.crop, query.state.as_deref())
        .await;

    Ok(warp::reply::json(&view))
}

/// GET /api/v1/market/supported-crops
pub async fn get_supported_crops() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "supported_crops": SUPPORTED_CROPS,
        "note": "These are Ayurvedic/medicinal crops tracked by our system",
    })))
}

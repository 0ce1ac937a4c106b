// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;

use crate::handlers::market::{
    get_best_mandis, get_market_prices, get_price_history, get_supported_crops, BestMandisQuery,
    HistoryQuery, PricesQuery,
};
use crate::handlers::recommend::{post_recommend, RecommendQuery};
use crate::services::mandi::MarketPriceAggregator;
use crate::services::recommend::RecommendationEngine;
use log::info;

use crate::handlers::error::ApiError;
use std::convert::Infallible;
use warp::{Filter, Reply};

// Add recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = api_error.message.clone();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    engine: Arc<RecommendationEngine>,
    aggregator: Arc<MarketPriceAggregator>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let engine_filter = warp::any().map(move || engine.clone());
    let aggregator_filter = warp::any().map(move || aggregator.clone());

    let recommend_route = warp::path!("api" / "v1" / "recommend")
        .and(warp::post())
        .and(warp::query::<RecommendQuery>())
        .and(warp::body::json::<serde_json::Value>())
        .and(engine_filter.clone())
        .and_then(post_recommend);

    let history_route = warp::path!("api" / "v1" / "market" / "prices" / "history")
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(aggregator_filter.clone())
        .and_then(get_price_history);

    let prices_route = warp::path!("api" / "v1" / "market" / "prices")
        .and(warp::get())
        .and(warp::query::<PricesQuery>())
        .and(aggregator_filter.clone())
        .and_then(get_market_prices);

    let best_mandis_route = warp::path!("api" / "v1" / "market" / "best-mandis")
        .and(warp::get())
        .and(warp::query::<BestMandisQuery>())
        .and(aggregator_filter.clone())
        .and_then(get_best_mandis);

    let supported_crops_route = warp::path!("api" / "v1" / "market" / "supported-crops")
        .and(warp::get())
        .and_then(get_supported_crops);

    info!("All routes configured successfully.");

    recommend_route
        .or(history_route)
        .or(prices_route)
        .or(best_mandis_route)
        .or(supported_crops_route)
        .recover(handle_rejection)
}

// src/services/mandi.rs
// Fetches agricultural commodity prices from data.gov.in (Agmarknet) and
// degrades to deterministic offline data when the API is unavailable.
use chrono::{Duration, Utc};
use log::{error, info, warn};
use rand::Rng;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration as StdDuration;

use crate::models::{
    BestMandis, MandiQuote, PriceHistory, PriceHistoryPoint, PriceRange, PriceSnapshot,
    PriceTrend,
};

/// How many quotes the "nearby mandis" view keeps after sorting.
pub const NEARBY_MANDI_LIMIT: usize = 5;

/// Variance threshold above which price dispersion reads as "volatile".
/// Inherited heuristic with no documented derivation; kept for compatibility.
const VOLATILITY_VARIANCE_THRESHOLD: f64 = 1000.0;

const DEFAULT_BASE_PRICE: f64 = 150.0;
const FETCH_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Why a live fetch produced no usable data. Every variant routes to the
/// fallback provider; none of them escapes the aggregator boundary.
#[derive(Debug)]
pub enum FetchError {
    /// Upstream answered with a non-success HTTP status.
    Status(u16),
    /// Connection, timeout, or body decode failure.
    Network(String),
    /// Upstream answered but the record list was empty.
    NoData,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "API Error: {}", code),
            FetchError::Network(msg) => write!(f, "Connection Error: {}", msg),
            FetchError::NoData => write!(f, "No data available"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Outbound query against the data.gov.in daily commodity price resource.
pub struct MandiClient {
    client: reqwest::Client,
    api_key: String,
    resource_id: String,
    base_url: String,
}

impl MandiClient {
    pub fn new(api_key: &str, resource_id: &str, base_url: &str) -> Self {
        let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            }
        };
        MandiClient {
            client,
            api_key: api_key.to_string(),
            resource_id: resource_id.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// One bounded-timeout query; any failure collapses to a [`FetchError`]
    /// reason rather than propagating the underlying error type.
    pub async fn fetch(
        &self,
        commodity: &str,
        state: Option<&str>,
        district: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/{}", self.base_url, self.resource_id);

        let mut params: Vec<(&str, String)> = vec![
            ("api-key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("limit", limit.to_string()),
            ("filters[commodity]", commodity.to_string()),
        ];
        if let Some(state) = state {
            params.push(("filters[state]", state.to_string()));
        }
        if let Some(district) = district {
            params.push(("filters[district]", district.to_string()));
        }

        info!("Fetching mandi prices from {} for {}", url, commodity);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(body
            .get("records")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Maps our crop names to data.gov.in commodity names; unmapped names are
/// title-cased and passed through.
pub fn commodity_name(crop: &str) -> String {
    match crop.to_lowercase().as_str() {
        "tulsi" => "Tulsi (Basil)".to_string(),
        "turmeric" | "haldi" => "Turmeric".to_string(),
        "ashwagandha" => "Ashwagandha".to_string(),
        "ginger" => "Ginger(Green)".to_string(),
        "aloe vera" => "Aloe Vera".to_string(),
        "amla" => "Amla(Nelli Kai)".to_string(),
        "neem" => "Neem Seed".to_string(),
        "shatavari" => "Shatavari".to_string(),
        "brahmi" => "Brahmi".to_string(),
        "giloy" => "Giloy".to_string(),
        other => title_case(other),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_str(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Upstream price fields arrive as numbers or numeric strings; anything
/// missing or malformed defaults to 0 so a bad record is kept, not dropped.
fn field_price(record: &Value, key: &str) -> f64 {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Converts raw API records into a [`PriceSnapshot`]: aggregate statistics,
/// quotes sorted by modal price (highest first for best selling), trend
/// classification, and truncation to the nearby-mandis view.
pub fn parse_records(records: &[Value], crop: &str) -> Result<PriceSnapshot, FetchError> {
    if records.is_empty() {
        return Err(FetchError::NoData);
    }

    let mut quotes = Vec::with_capacity(records.len());
    let mut prices = Vec::with_capacity(records.len());

    for record in records {
        let quote = MandiQuote {
            name: format!(
                "{} Mandi",
                record.get("market").and_then(Value::as_str).unwrap_or("Unknown")
            ),
            state: field_str(record, "state"),
            district: field_str(record, "district"),
            price_min: field_price(record, "min_price"),
            price_max: field_price(record, "max_price"),
            price_modal: field_price(record, "modal_price"),
            arrival_date: field_str(record, "arrival_date"),
            variety: field_str(record, "variety"),
        };
        prices.push(quote.price_modal);
        quotes.push(quote);
    }

    let avg = prices.iter().sum::<f64>() / prices.len() as f64;
    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // Trend looks at prices in API return order, before sorting.
    let trend = classify_trend(&prices);

    quotes.sort_by(|a, b| {
        b.price_modal
            .partial_cmp(&a.price_modal)
            .unwrap_or(Ordering::Equal)
    });
    let total_mandis_found = quotes.len();
    quotes.truncate(NEARBY_MANDI_LIMIT);

    Ok(PriceSnapshot {
        success: true,
        error: None,
        crop: crop.to_string(),
        data_source: "data.gov.in (Agmarknet)".to_string(),
        last_updated: Utc::now().to_rfc3339(),
        current_price_avg: round2(avg),
        price_range: PriceRange {
            min: round2(min),
            max: round2(max),
        },
        trend,
        best_mandi: quotes.first().cloned(),
        nearby_mandis: quotes,
        total_mandis_found,
        note: None,
    })
}

/// Heuristic trend over prices in API return order, not a true time series.
/// The variance check must run before the directional check.
pub fn classify_trend(prices: &[f64]) -> PriceTrend {
    if prices.len() < 2 {
        return PriceTrend::Stable;
    }

    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    let variance =
        prices.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / prices.len() as f64;

    if variance > VOLATILITY_VARIANCE_THRESHOLD {
        PriceTrend::Volatile
    } else if prices[0] > mean {
        PriceTrend::Increasing
    } else if prices[0] < mean {
        PriceTrend::Decreasing
    } else {
        PriceTrend::Stable
    }
}

/// Approximate offline market rates for Ayurvedic crops, per quintal.
fn fallback_base_price(crop: &str) -> f64 {
    match crop.to_lowercase().as_str() {
        "tulsi" => 150.0,
        "turmeric" => 180.0,
        "ashwagandha" => 350.0,
        "ginger" => 120.0,
        "aloe vera" => 80.0,
        "amla" => 60.0,
        "neem" => 90.0,
        "shatavari" => 400.0,
        "brahmi" => 200.0,
        "giloy" => 100.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// Synthesized snapshot for when the live source is unavailable. Always
/// structurally valid, with at least one mandi entry.
pub fn fallback_snapshot(crop: &str, reason: &str) -> PriceSnapshot {
    let base = fallback_base_price(crop);
    let quote = MandiQuote {
        name: "Local Mandi".to_string(),
        state: "Maharashtra".to_string(),
        district: "Pune".to_string(),
        price_min: round2(base * 0.8),
        price_max: round2(base * 1.2),
        price_modal: base,
        arrival_date: String::new(),
        variety: String::new(),
    };

    PriceSnapshot {
        success: false,
        error: Some(reason.to_string()),
        crop: crop.to_string(),
        data_source: "Fallback (offline data)".to_string(),
        last_updated: Utc::now().to_rfc3339(),
        current_price_avg: base,
        price_range: PriceRange {
            min: round2(base * 0.8),
            max: round2(base * 1.2),
        },
        trend: PriceTrend::Stable,
        best_mandi: Some(quote.clone()),
        nearby_mandis: vec![quote],
        total_mandis_found: 1,
        note: Some(
            "Using cached/fallback data. Connect to internet for live prices.".to_string(),
        ),
    }
}

/// Simulated daily price series ending today, each point within ±10% of the
/// base price. The upstream source does not reliably expose history.
pub fn simulate_history(base_price: f64, days: usize) -> Vec<PriceHistoryPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();

    (0..days)
        .map(|i| {
            let date = today - Duration::days((days - 1 - i) as i64);
            let variation: f64 = rng.gen_range(-0.1..0.1);
            PriceHistoryPoint {
                date: date.format("%Y-%m-%d").to_string(),
                price: round2(base_price * (1.0 + variation)),
            }
        })
        .collect()
}

/// Orchestrates client -> parser, degrading to the fallback provider on any
/// failure. Callers always receive a well-formed snapshot.
pub struct MarketPriceAggregator {
    client: MandiClient,
}

impl MarketPriceAggregator {
    pub fn new(client: MandiClient) -> Self {
        MarketPriceAggregator { client }
    }

    pub async fn fetch(
        &self,
        crop: &str,
        state: Option<&str>,
        district: Option<&str>,
        limit: usize,
    ) -> PriceSnapshot {
        let commodity = commodity_name(crop);

        match self.client.fetch(&commodity, state, district, limit).await {
            Ok(records) => match parse_records(&records, crop) {
                Ok(snapshot) => {
                    info!(
                        "Parsed {} mandi records for {}",
                        snapshot.total_mandis_found, crop
                    );
                    snapshot
                }
                Err(e) => {
                    warn!("No usable mandi records for {}: {}", crop, e);
                    fallback_snapshot(crop, &e.to_string())
                }
            },
            Err(e) => {
                error!("Mandi price fetch failed for {}: {}", crop, e);
                fallback_snapshot(crop, &e.to_string())
            }
        }
    }

    /// Simulated price history seeded from the current aggregate price.
    pub async fn history(&self, crop: &str, days: usize) -> PriceHistory {
        let snapshot = self.fetch(crop, None, None, 10).await;

        PriceHistory {
            crop: crop.to_string(),
            days,
            history: simulate_history(snapshot.current_price_avg, days),
            note: "Historical data simulated. Real historical API integration pending."
                .to_string(),
        }
    }

    /// Top-5 view over a larger sample, for farmers deciding where to sell.
    pub async fn best_mandis(&self, crop: &str, state: Option<&str>) -> BestMandis {
        let snapshot = self.fetch(crop, state, None, 20).await;

        BestMandis {
            crop: crop.to_string(),
            best_mandis: snapshot
                .nearby_mandis
                .iter()
                .take(NEARBY_MANDI_LIMIT)
                .cloned()
                .collect(),
            recommendation: snapshot.best_mandi.clone(),
            average_price: snapshot.current_price_avg,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(market: &str, modal: f64) -> Value {
        json!({
            "market": market,
            "state": "Maharashtra",
            "district": "Pune",
            "min_price": modal - 10.0,
            "max_price": modal + 10.0,
            "modal_price": modal,
            "arrival_date": "2024-01-15",
            "variety": "Other"
        })
    }

    #[test]
    fn trend_is_stable_for_flat_prices() {
        assert_eq!(classify_trend(&[100.0, 100.0, 100.0]), PriceTrend::Stable);
    }

    #[test]
    fn trend_is_stable_for_fewer_than_two_prices() {
        assert_eq!(classify_trend(&[250.0]), PriceTrend::Stable);
        assert_eq!(classify_trend(&[]), PriceTrend::Stable);
    }

    #[test]
    fn high_variance_reads_volatile_before_direction() {
        // Variance 5000, well above the threshold; direction is ignored.
        assert_eq!(classify_trend(&[50.0, 200.0, 50.0]), PriceTrend::Volatile);
    }

    #[test]
    fn first_price_above_mean_reads_increasing() {
        // Variance 66.7, below the threshold; first price 110 > mean 100.
        assert_eq!(classify_trend(&[110.0, 90.0, 100.0]), PriceTrend::Increasing);
    }

    #[test]
    fn first_price_below_mean_reads_decreasing() {
        assert_eq!(classify_trend(&[90.0, 110.0, 100.0]), PriceTrend::Decreasing);
    }

    #[test]
    fn parse_sorts_descending_and_truncates_to_five() {
        let records: Vec<Value> = (1..=8)
            .map(|i| record(&format!("Market{}", i), i as f64 * 100.0))
            .collect();

        let snapshot = parse_records(&records, "turmeric").unwrap();
        assert!(snapshot.success);
        assert_eq!(snapshot.total_mandis_found, 8);
        assert_eq!(snapshot.nearby_mandis.len(), 5);
        assert_eq!(snapshot.nearby_mandis[0].price_modal, 800.0);
        for pair in snapshot.nearby_mandis.windows(2) {
            assert!(pair[0].price_modal >= pair[1].price_modal);
        }
        let best = snapshot.best_mandi.unwrap();
        assert_eq!(best.name, "Market8 Mandi");
        assert_eq!(snapshot.price_range.min, 100.0);
        assert_eq!(snapshot.price_range.max, 800.0);
        assert_eq!(snapshot.current_price_avg, 450.0);
    }

    #[test]
    fn non_numeric_price_defaults_to_zero_without_dropping_record() {
        let mut bad = record("Nashik", 120.0);
        bad["min_price"] = json!("NR");
        bad["max_price"] = serde_json::Value::Null;

        let snapshot = parse_records(&[bad], "ginger").unwrap();
        assert_eq!(snapshot.total_mandis_found, 1);
        assert_eq!(snapshot.nearby_mandis[0].price_min, 0.0);
        assert_eq!(snapshot.nearby_mandis[0].price_max, 0.0);
        assert_eq!(snapshot.nearby_mandis[0].price_modal, 120.0);
    }

    #[test]
    fn empty_records_are_a_no_data_failure() {
        let err = parse_records(&[], "tulsi").unwrap_err();
        assert!(matches!(err, FetchError::NoData));
        assert_eq!(err.to_string(), "No data available");
    }

    #[test]
    fn fallback_snapshot_is_always_populated() {
        let snapshot = fallback_snapshot("tulsi", "Connection Error: refused");
        assert!(!snapshot.success);
        assert_eq!(snapshot.current_price_avg, 150.0);
        assert!(snapshot.nearby_mandis.len() >= 1);
        assert!(snapshot.best_mandi.is_some());
        assert_eq!(snapshot.price_range.min, 120.0);
        assert_eq!(snapshot.price_range.max, 180.0);
        assert_eq!(snapshot.trend, PriceTrend::Stable);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Connection Error: refused")
        );
    }

    #[test]
    fn unknown_crop_falls_back_to_default_base_price() {
        let snapshot = fallback_snapshot("dragonfruit", "API Error: 503");
        assert_eq!(snapshot.current_price_avg, 150.0);
    }

    #[test]
    fn commodity_mapping_and_title_case_passthrough() {
        assert_eq!(commodity_name("tulsi"), "Tulsi (Basil)");
        assert_eq!(commodity_name("HALDI"), "Turmeric");
        assert_eq!(commodity_name("amla"), "Amla(Nelli Kai)");
        assert_eq!(commodity_name("black pepper"), "Black Pepper");
    }

    #[test]
    fn simulated_history_spans_days_ending_today() {
        let history = simulate_history(150.0, 30);
        assert_eq!(history.len(), 30);

        let today = Utc::now().date_naive();
        let dates: Vec<NaiveDate> = history
            .iter()
            .map(|p| NaiveDate::parse_from_str(&p.date, "%Y-%m-%d").unwrap())
            .collect();
        assert_eq!(*dates.last().unwrap(), today);
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for point in &history {
            assert!(point.price >= 150.0 * 0.9 - 0.01);
            assert!(point.price <= 150.0 * 1.1 + 0.01);
        }
    }

    #[tokio::test]
    async fn fetch_degrades_to_fallback_when_api_unreachable() {
        // Port 9 (discard) refuses connections immediately.
        let client = MandiClient::new("", "resource", "http://127.0.0.1:9");
        let aggregator = MarketPriceAggregator::new(client);

        let snapshot = aggregator.fetch("tulsi", None, None, 10).await;
        assert!(!snapshot.success);
        assert!(snapshot.nearby_mandis.len() >= 1);
        assert_eq!(snapshot.current_price_avg, 150.0);
        assert!(snapshot.error.unwrap().starts_with("Connection Error"));
    }

    #[tokio::test]
    async fn best_mandis_view_is_well_formed_under_failure() {
        let client = MandiClient::new("", "resource", "http://127.0.0.1:9");
        let aggregator = MarketPriceAggregator::new(client);

        let view = aggregator.best_mandis("shatavari", Some("Maharashtra")).await;
        assert_eq!(view.crop, "shatavari");
        assert!(!view.best_mandis.is_empty());
        assert!(view.recommendation.is_some());
        assert_eq!(view.average_price, 400.0);
    }
}

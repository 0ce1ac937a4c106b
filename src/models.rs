// src/models.rs
use serde::{Deserialize, Serialize};

fn default_soil_type() -> String {
    "Loamy".to_string()
}

fn default_climate_zone() -> String {
    "Tropical".to_string()
}

/// One farm's soil/climate/budget attributes as supplied by the caller.
/// Missing numeric fields fall back to 0, missing categoricals to the
/// vocabulary defaults, so a sparse payload still produces a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmProfile {
    #[serde(default)]
    pub nitrogen: f64,
    #[serde(default)]
    pub phosphorus: f64,
    #[serde(default)]
    pub potassium: f64,
    #[serde(default)]
    pub ph: f64,
    #[serde(default)]
    pub soil_moisture: f64,
    #[serde(default)]
    pub organic_carbon: f64,
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub budget: f64,
    #[serde(default = "default_climate_zone")]
    pub climate_zone: String,
}

impl FarmProfile {
    /// Demo profile used when a caller posts an empty payload.
    pub fn demo() -> Self {
        FarmProfile {
            nitrogen: 80.0,
            phosphorus: 40.0,
            potassium: 40.0,
            ph: 6.5,
            soil_moisture: 50.0,
            organic_carbon: 0.5,
            soil_type: default_soil_type(),
            temperature: 25.0,
            rainfall: 1000.0,
            humidity: 60.0,
            budget: 50000.0,
            climate_zone: default_climate_zone(),
        }
    }
}

/// Coarse suitability label derived from the normalized match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    #[serde(rename = "Strongly Suitable")]
    StronglySuitable,
    #[serde(rename = "Suitable")]
    Suitable,
    #[serde(rename = "Moderately Suitable")]
    ModeratelySuitable,
    #[serde(rename = "Low Suitability")]
    LowSuitability,
}

impl ConfidenceBand {
    /// Thresholds are inclusive at the lower bound of each band.
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            ConfidenceBand::StronglySuitable
        } else if score >= 40.0 {
            ConfidenceBand::Suitable
        } else if score >= 25.0 {
            ConfidenceBand::ModeratelySuitable
        } else {
            ConfidenceBand::LowSuitability
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub rank: usize,
    pub crop_name: String,
    pub match_score: f64,
    pub confidence_band: ConfidenceBand,
    pub profit_estimate: i64,
    pub reasons: Vec<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Stable,
    Volatile,
    Increasing,
    Decreasing,
}

/// One market's reported prices for a commodity on a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandiQuote {
    pub name: String,
    pub state: String,
    pub district: String,
    pub price_min: f64,
    pub price_max: f64,
    pub price_modal: f64,
    pub arrival_date: String,
    pub variety: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Aggregated market view for one crop. `success: false` marks a fallback
/// snapshot, which still carries at least one synthesized mandi entry so
/// consumers never have to null-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub crop: String,
    pub data_source: String,
    pub last_updated: String,
    pub current_price_avg: f64,
    pub price_range: PriceRange,
    pub trend: PriceTrend,
    pub nearby_mandis: Vec<MandiQuote>,
    pub best_mandi: Option<MandiQuote>,
    pub total_mandis_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub date: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub crop: String,
    pub days: usize,
    pub history: Vec<PriceHistoryPoint>,
    pub note: String,
}

/// Convenience view for the best-mandis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestMandis {
    pub crop: String,
    pub best_mandis: Vec<MandiQuote>,
    pub recommendation: Option<MandiQuote>,
    pub average_price: f64,
}

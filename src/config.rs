// src/config.rs
use log::warn;
use std::env;

/// Ayurvedic crops tracked for market price lookup, matching the commodity
/// names used by data.gov.in.
pub const SUPPORTED_CROPS: &[&str] = &[
    "Turmeric",
    "Ginger",
    "Aloe Vera",
    "Amla",
    "Neem Seed",
    "Ashwagandha",
    "Tulsi",
    "Shatavari",
    "Brahmi",
    "Giloy",
    "Safed Musli",
    "Isabgol",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_gov_api_key: String,
    pub mandi_resource_id: String,
    pub data_gov_base_url: String,
    pub model_path: String,
    pub encoders_path: String,
}

impl Settings {
    /// Reads settings from the environment, falling back to defaults that
    /// work for local development.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(|| {
                warn!("$PORT not set or invalid, defaulting to 3030");
                3030
            });

        let data_gov_api_key = env::var("DATA_GOV_API_KEY").unwrap_or_else(|_| {
            warn!("DATA_GOV_API_KEY not set, market fetches will use fallback data");
            String::new()
        });

        Settings {
            port,
            data_gov_api_key,
            // Resource ID for daily commodity prices on data.gov.in
            mandi_resource_id: env::var("MANDI_RESOURCE_ID")
                .unwrap_or_else(|_| "9ef84268-d588-465a-a308-a864a43d0070".to_string()),
            data_gov_base_url: env::var("DATA_GOV_BASE_URL")
                .unwrap_or_else(|_| "https://api.data.gov.in/resource".to_string()),
            model_path: env::var("CROP_MODEL_PATH")
                .unwrap_or_else(|_| "dataset/crop_model.json".to_string()),
            encoders_path: env::var("LABEL_ENCODERS_PATH")
                .unwrap_or_else(|_| "dataset/label_encoders.json".to_string()),
        }
    }
}

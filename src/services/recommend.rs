// src/services/recommend.rs
use log::{info, warn};
use std::cmp::Ordering;

use crate::models::{ConfidenceBand, CropRecommendation, FarmProfile};
use crate::services::classifier::{CropClassifier, ModelArtifacts};
use crate::services::encoders::CategoricalEncoder;
use crate::services::features::FeatureVectorBuilder;

/// Heuristic profit factors carried over from the original model work.
/// Flagged for product-owner review; linear shape must be preserved.
const PROFIT_PER_SCORE_POINT: f64 = 500.0;
const PROFIT_BUDGET_FACTOR: f64 = 0.2;

enum ModelState {
    Loaded {
        classifier: Box<dyn CropClassifier>,
        features: FeatureVectorBuilder,
        target_classes: Vec<String>,
    },
    Unavailable,
}

/// Owns the loaded classifier and encoders; shared read-only across requests.
/// Recommendation is advisory, so every failure path degrades to an empty
/// list instead of surfacing an error.
pub struct RecommendationEngine {
    state: ModelState,
}

impl RecommendationEngine {
    pub fn new(
        classifier: Box<dyn CropClassifier>,
        encoder: CategoricalEncoder,
        target_classes: Vec<String>,
    ) -> Self {
        RecommendationEngine {
            state: ModelState::Loaded {
                classifier,
                features: FeatureVectorBuilder::new(encoder),
                target_classes,
            },
        }
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        let encoder = CategoricalEncoder::new(artifacts.encoders.features.clone());
        Self::new(
            Box::new(artifacts.classifier),
            encoder,
            artifacts.encoders.target,
        )
    }

    /// Degraded mode used when the model artifacts are missing at startup.
    pub fn unavailable() -> Self {
        RecommendationEngine {
            state: ModelState::Unavailable,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded { .. })
    }

    /// Ranks the `top_k` most probable crops for the given profile, with
    /// scores renormalized over the shown candidates so they sum to 100.
    pub fn recommend(&self, profile: &FarmProfile, top_k: usize) -> Vec<CropRecommendation> {
        let ModelState::Loaded {
            classifier,
            features,
            target_classes,
        } = &self.state
        else {
            info!("Recommendation requested but model is not loaded");
            return Vec::new();
        };

        if top_k == 0 {
            return Vec::new();
        }

        let vector = features.build(profile);
        let probs = classifier.predict_class_probabilities(&vector);
        if probs.is_empty() {
            warn!("Classifier returned no class probabilities");
            return Vec::new();
        }

        // Highest probability first; ties keep original class-index order.
        let mut indices: Vec<usize> = (0..probs.len()).collect();
        indices.sort_by(|&a, &b| {
            probs[b]
                .partial_cmp(&probs[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        indices.truncate(top_k);

        let selected_total: f64 = indices.iter().map(|&i| probs[i]).sum();

        indices
            .iter()
            .enumerate()
            .map(|(rank, &idx)| {
                let score = if selected_total > 0.0 {
                    round1(probs[idx] / selected_total * 100.0)
                } else {
                    0.0
                };
                let crop_name = target_classes
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("Class {}", idx));
                let profit_estimate = (score * PROFIT_PER_SCORE_POINT
                    + profile.budget * PROFIT_BUDGET_FACTOR)
                    .round()
                    .max(0.0) as i64;

                CropRecommendation {
                    rank: rank + 1,
                    icon: crop_icon(&crop_name).to_string(),
                    crop_name,
                    match_score: score,
                    confidence_band: ConfidenceBand::from_score(score),
                    profit_estimate,
                    reasons: vec![
                        "Suitable for your soil".to_string(),
                        "Good market potential".to_string(),
                    ],
                }
            })
            .collect()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Display glyph for a crop; falls back to a generic plant.
fn crop_icon(crop: &str) -> &'static str {
    match crop {
        "Tulsi" | "Shatavari" | "Gudmar" | "Kalmegh" => "🌿",
        "Ashwagandha" | "Kutki" => "🌱",
        "Neem" => "🌳",
        "Brahmi" => "🍃",
        "Aloe Vera" | "Vach" => "🪴",
        "Amla" => "🫒",
        "Turmeric" | "Daruhaldi" => "🟡",
        "Ginger" => "🫚",
        "Giloy" | "Sarpgandha" => "🐍",
        "Safed Musli" => "🥬",
        "Isabgol" | "Rasna" => "🌾",
        "Pippali" => "🌶️",
        "Rice" | "Wheat" | "Pearl Millet" | "Sorghum" | "Finger Millet" => "🌾",
        "Maize" => "🌽",
        "Mustard" | "Sunflower" => "🌻",
        "Groundnut" => "🥜",
        "Cotton" => "☁️",
        "Sugarcane" => "🎋",
        _ => "🌱",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Stub predictor returning a canned probability vector.
    struct FixedClassifier {
        probs: Vec<f64>,
    }

    impl CropClassifier for FixedClassifier {
        fn predict_class_probabilities(&self, _features: &[f64]) -> Vec<f64> {
            self.probs.clone()
        }

        fn class_count(&self) -> usize {
            self.probs.len()
        }
    }

    fn engine_with(probs: Vec<f64>) -> RecommendationEngine {
        let targets = (0..probs.len()).map(|i| format!("Crop{}", i)).collect();
        RecommendationEngine::new(
            Box::new(FixedClassifier { probs }),
            CategoricalEncoder::new(HashMap::new()),
            targets,
        )
    }

    #[test]
    fn normalized_scores_sum_to_one_hundred() {
        let engine = engine_with(vec![0.02, 0.10, 0.05, 0.01, 0.03]);
        let recs = engine.recommend(&FarmProfile::demo(), 3);
        assert_eq!(recs.len(), 3);
        let sum: f64 = recs.iter().map(|r| r.match_score).sum();
        assert!((sum - 100.0).abs() <= 0.1, "scores summed to {}", sum);
    }

    #[test]
    fn scores_are_non_increasing_by_rank() {
        let engine = engine_with(vec![0.4, 0.1, 0.25, 0.25]);
        let recs = engine.recommend(&FarmProfile::demo(), 4);
        for pair in recs.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
    }

    #[test]
    fn ties_keep_original_class_order() {
        let engine = engine_with(vec![0.25, 0.25, 0.5]);
        let recs = engine.recommend(&FarmProfile::demo(), 3);
        assert_eq!(recs[0].crop_name, "Crop2");
        assert_eq!(recs[1].crop_name, "Crop0");
        assert_eq!(recs[2].crop_name, "Crop1");
    }

    #[test]
    fn all_zero_probabilities_score_zero() {
        let engine = engine_with(vec![0.0, 0.0, 0.0]);
        let recs = engine.recommend(&FarmProfile::demo(), 3);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.match_score == 0.0));
    }

    #[test]
    fn confidence_bands_follow_thresholds() {
        assert_eq!(
            ConfidenceBand::from_score(55.0),
            ConfidenceBand::StronglySuitable
        );
        assert_eq!(ConfidenceBand::from_score(50.0), ConfidenceBand::StronglySuitable);
        assert_eq!(ConfidenceBand::from_score(45.0), ConfidenceBand::Suitable);
        assert_eq!(ConfidenceBand::from_score(40.0), ConfidenceBand::Suitable);
        assert_eq!(
            ConfidenceBand::from_score(30.0),
            ConfidenceBand::ModeratelySuitable
        );
        assert_eq!(
            ConfidenceBand::from_score(10.0),
            ConfidenceBand::LowSuitability
        );
    }

    #[test]
    fn unavailable_engine_returns_empty() {
        let engine = RecommendationEngine::unavailable();
        assert!(!engine.is_loaded());
        assert!(engine.recommend(&FarmProfile::demo(), 3).is_empty());
    }

    #[test]
    fn profit_estimate_is_linear_in_score_and_budget() {
        let engine = engine_with(vec![1.0]);
        let mut profile = FarmProfile::demo();
        profile.budget = 10000.0;
        let recs = engine.recommend(&profile, 1);
        // Single candidate normalizes to score 100.
        assert_eq!(recs[0].match_score, 100.0);
        assert_eq!(recs[0].profit_estimate, 52000);
    }
}

// src/services/classifier.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

/// Pre-fitted multi-class probability predictor. The recommendation engine
/// only depends on this capability, never on the model family behind it.
pub trait CropClassifier: Send + Sync {
    /// Class probabilities keyed by class index. Must sum to 1 whenever any
    /// class is reachable from the given features.
    fn predict_class_probabilities(&self, features: &[f64]) -> Vec<f64>;

    fn class_count(&self) -> usize;
}

/// Nearest-prototype model exported by the training pipeline: one feature
/// centroid per crop class, with probabilities derived from inverse squared
/// distance to each centroid.
#[derive(Debug, Clone, Deserialize)]
pub struct PrototypeClassifier {
    pub feature_names: Vec<String>,
    pub prototypes: Vec<Vec<f64>>,
}

impl CropClassifier for PrototypeClassifier {
    fn predict_class_probabilities(&self, features: &[f64]) -> Vec<f64> {
        let weights: Vec<f64> = self
            .prototypes
            .iter()
            .map(|proto| {
                let dist_sq: f64 = proto
                    .iter()
                    .zip(features)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                1.0 / (1.0 + dist_sq)
            })
            .collect();

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return vec![0.0; weights.len()];
        }
        weights.into_iter().map(|w| w / total).collect()
    }

    fn class_count(&self) -> usize {
        self.prototypes.len()
    }
}

/// Per-feature categorical vocabularies plus the target-class decoder, as
/// captured at training time.
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderArtifacts {
    pub features: HashMap<String, Vec<String>>,
    /// Class index -> crop name.
    pub target: Vec<String>,
}

/// The two artifact files loaded once at startup. Absence of either disables
/// the recommendation engine rather than crashing the process.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub classifier: PrototypeClassifier,
    pub encoders: EncoderArtifacts,
}

impl ModelArtifacts {
    pub fn load(model_path: &str, encoders_path: &str) -> Result<Self> {
        let model_text = fs::read_to_string(model_path)
            .with_context(|| format!("reading model artifact {}", model_path))?;
        let classifier: PrototypeClassifier = serde_json::from_str(&model_text)
            .with_context(|| format!("parsing model artifact {}", model_path))?;

        let encoders_text = fs::read_to_string(encoders_path)
            .with_context(|| format!("reading encoder artifact {}", encoders_path))?;
        let encoders: EncoderArtifacts = serde_json::from_str(&encoders_text)
            .with_context(|| format!("parsing encoder artifact {}", encoders_path))?;

        if classifier.class_count() != encoders.target.len() {
            bail!(
                "model has {} classes but target decoder has {}",
                classifier.class_count(),
                encoders.target.len()
            );
        }

        Ok(ModelArtifacts {
            classifier,
            encoders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototype_probabilities_sum_to_one() {
        let model = PrototypeClassifier {
            feature_names: vec!["a".to_string(), "b".to_string()],
            prototypes: vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![5.0, 5.0]],
        };
        let probs = model.predict_class_probabilities(&[1.0, 1.0]);
        assert_eq!(probs.len(), 3);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Closest prototype wins.
        assert!(probs[0] > probs[1] && probs[0] > probs[2]);
    }

    #[test]
    fn load_reports_missing_artifacts() {
        let err = ModelArtifacts::load("/no/such/model.json", "/no/such/encoders.json")
            .unwrap_err();
        assert!(err.to_string().contains("model artifact"));
    }
}

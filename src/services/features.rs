// src/services/features.rs
use crate::models::FarmProfile;
use crate::services::encoders::CategoricalEncoder;

/// Assembles the numeric feature vector the classifier expects.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    encoder: CategoricalEncoder,
}

impl FeatureVectorBuilder {
    pub fn new(encoder: CategoricalEncoder) -> Self {
        FeatureVectorBuilder { encoder }
    }

    /// Field order is a hard contract with the trained classifier; reordering
    /// it makes the predictions meaningless.
    pub fn build(&self, profile: &FarmProfile) -> Vec<f64> {
        vec![
            profile.nitrogen,
            profile.phosphorus,
            profile.potassium,
            profile.ph,
            profile.soil_moisture,
            profile.organic_carbon,
            self.encoder.encode("soil_type", &profile.soil_type) as f64,
            profile.temperature,
            profile.rainfall,
            profile.humidity,
            profile.budget,
            self.encoder.encode("climate_zone", &profile.climate_zone) as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn vector_follows_training_field_order() {
        let mut vocab = HashMap::new();
        vocab.insert(
            "soil_type".to_string(),
            vec!["Clay".to_string(), "Loamy".to_string()],
        );
        vocab.insert(
            "climate_zone".to_string(),
            vec!["Temperate".to_string(), "Tropical".to_string()],
        );
        let builder = FeatureVectorBuilder::new(CategoricalEncoder::new(vocab));

        let mut profile = FarmProfile::demo();
        profile.soil_type = "Loamy".to_string();
        profile.climate_zone = "Tropical".to_string();

        let vector = builder.build(&profile);
        assert_eq!(
            vector,
            vec![80.0, 40.0, 40.0, 6.5, 50.0, 0.5, 1.0, 25.0, 1000.0, 60.0, 50000.0, 1.0]
        );
    }

    #[test]
    fn unknown_categoricals_encode_to_zero() {
        let builder = FeatureVectorBuilder::new(CategoricalEncoder::new(HashMap::new()));
        let vector = builder.build(&FarmProfile::demo());
        assert_eq!(vector[6], 0.0);
        assert_eq!(vector[11], 0.0);
    }
}

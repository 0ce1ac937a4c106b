// src/services/encoders.rs
use std::collections::HashMap;

/// Code used for any feature or value outside the trained vocabulary.
/// An unseen category degrades to "unknown" instead of aborting the
/// recommendation.
pub const FALLBACK_CODE: i64 = 0;

/// Maps free-text categorical attributes to the integer codes the classifier
/// was trained on. Vocabularies are fixed at training time; lookups have no
/// side effects.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    vocabularies: HashMap<String, Vec<String>>,
}

impl CategoricalEncoder {
    pub fn new(vocabularies: HashMap<String, Vec<String>>) -> Self {
        CategoricalEncoder { vocabularies }
    }

    /// Returns the trained code for `value` under `feature`, or
    /// [`FALLBACK_CODE`] when either is unrecognized.
    pub fn encode(&self, feature: &str, value: &str) -> i64 {
        self.vocabularies
            .get(feature)
            .and_then(|vocab| vocab.iter().position(|v| v == value))
            .map(|pos| pos as i64)
            .unwrap_or(FALLBACK_CODE)
    }
}

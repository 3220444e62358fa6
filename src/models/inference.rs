//! Inference engine: preprocessing plus a single predictor call

use super::predictor::Predictor;
use crate::error::{ScoringError, ScoringResult};
use crate::feature_extractor::FeatureExtractor;
use crate::features::FeatureVector;
use crate::types::prediction::Prediction;
use crate::types::transaction::Transaction;
use std::time::Instant;
use tracing::debug;

/// A loaded model ready to score transactions.
///
/// Immutable once built, so one engine can be shared across handlers.
pub struct InferenceEngine {
    predictor: Box<dyn Predictor>,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    pub fn new(predictor: Box<dyn Predictor>, extractor: FeatureExtractor) -> Self {
        Self {
            predictor,
            extractor,
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Preprocess one transaction and classify it.
    pub fn score(&self, transaction: &Transaction) -> ScoringResult<Prediction> {
        let start = Instant::now();
        let features = self.extractor.extract(std::slice::from_ref(transaction))?;
        let prediction = self.predict(&features)?;

        debug!(
            transaction_id = transaction.transaction_id,
            label = prediction.label,
            score = ?prediction.score,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Transaction scored"
        );

        Ok(prediction)
    }

    /// Run the predictor on a feature matrix holding exactly one row.
    pub fn predict(&self, rows: &[FeatureVector]) -> ScoringResult<Prediction> {
        let [row] = rows else {
            return Err(ScoringError::Prediction(format!(
                "expected exactly one feature row, got {}",
                rows.len()
            )));
        };

        let input = row.to_f32_vec();
        if let Some(width) = self.predictor.input_width() {
            if width != input.len() {
                return Err(ScoringError::ModelInvalid(format!(
                    "{} predictor expects {} features, pipeline produced {}",
                    self.predictor.name(),
                    width,
                    input.len()
                )));
            }
        }

        self.predictor.predict(&input)
    }
}

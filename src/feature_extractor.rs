//! Feature extraction for fraud scoring model inference.
//!
//! Runs the preprocessing pipeline that turns validated transactions into
//! model input: categorical imputation, per-customer aggregation, calendar
//! fields, `PricingStrategy` encoding, min-max normalization, the RFMS
//! composite score, numeric fill and finally the RFMS bin. Output columns
//! follow [`FEATURE_NAMES`], the order the model artifact is fit on.

use crate::error::ScoringResult;
use crate::features::{
    FeatureVector, FillStrategy, FrozenTransformers, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::types::transaction::Transaction;
use tracing::debug;

/// Feature extractor that transforms transactions into model input features.
///
/// With frozen transformers every batch is encoded and scaled with the
/// training-time parameters. Without them the parameters are refit on each
/// batch, so a single-row request always encodes `PricingStrategy` as 0,
/// collapses every normalized column to 0.0 and lands in RFMS bin 0.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    transformers: Option<FrozenTransformers>,
    fill: FillStrategy,
}

impl FeatureExtractor {
    /// Create an extractor that refits on every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor applying training-time parameters.
    pub fn with_transformers(transformers: FrozenTransformers) -> Self {
        Self {
            transformers: Some(transformers),
            fill: FillStrategy::default(),
        }
    }

    pub fn with_fill_strategy(mut self, fill: FillStrategy) -> Self {
        self.fill = fill;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.transformers.is_some()
    }

    /// Extract feature vectors for a batch, one per transaction in input
    /// order. An empty batch yields no rows.
    pub fn extract(&self, batch: &[Transaction]) -> ScoringResult<Vec<FeatureVector>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let refit;
        let transformers = match &self.transformers {
            Some(frozen) => frozen,
            None => {
                refit = FrozenTransformers::fit(batch)?;
                &refit
            }
        };

        let vectors = transformers.transform(batch, self.fill)?;

        debug!(
            rows = vectors.len(),
            frozen = self.is_frozen(),
            fill = ?self.fill,
            "Extracted feature vectors"
        );

        Ok(vectors)
    }

    /// Extract the feature vector of a single transaction.
    pub fn extract_one(&self, tx: &Transaction) -> ScoringResult<FeatureVector> {
        let mut vectors = self.extract(std::slice::from_ref(tx))?;
        Ok(vectors.remove(0))
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in model input order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;

    fn single() -> Transaction {
        Transaction::new(1, 3001, 100.0, 10.0, "2023-01-02 11:00:00", Some("A"))
    }

    #[test]
    fn test_single_row_feature_columns() {
        let extractor = FeatureExtractor::new();
        let vector = extractor.extract_one(&single()).unwrap();

        let json = serde_json::to_value(vector).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), extractor.feature_count());
        for name in extractor.feature_names() {
            assert!(object.contains_key(*name));
        }
        for dropped in ["TransactionId", "CustomerId", "TransactionStartTime"] {
            assert!(!object.contains_key(dropped));
        }
    }

    #[test]
    fn test_single_row_degenerate_batch() {
        let vector = FeatureExtractor::new().extract_one(&single()).unwrap();

        assert_eq!(vector.pricing_strategy, 0.0);
        assert_eq!(vector.rfms_binned, 0.0);
        assert_eq!(vector.amount, 0.0);
        assert_eq!(vector.value, 0.0);
        assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let batch = [
            single(),
            Transaction::new(2, 3001, 250.0, 25.0, "2023-01-03 12:30:00", Some("B")),
            Transaction::new(3, 3002, 40.0, 4.0, "2022-12-31 23:59:59", Some("A")),
        ];
        let extractor = FeatureExtractor::new();

        let first = extractor.extract(&batch).unwrap();
        let second = extractor.extract(&batch).unwrap();

        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(&second) {
            let a_bits: Vec<u64> = a.values().iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u64> = b.values().iter().map(|v| v.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_customer_aggregates_in_batch() {
        let batch = [
            single(),
            Transaction::new(2, 3001, 300.0, 30.0, "2023-01-03 12:00:00", Some("A")),
            Transaction::new(3, 3002, 50.0, 5.0, "2023-01-04 12:00:00", Some("A")),
        ];

        let vectors = FeatureExtractor::new().extract(&batch).unwrap();

        // Customer 3001 has the larger total, count and average
        assert_eq!(vectors[0].total_transaction_amount, 1.0);
        assert_eq!(vectors[1].total_transaction_amount, 1.0);
        assert_eq!(vectors[2].total_transaction_amount, 0.0);
        assert_eq!(vectors[0].transaction_count, 1.0);
        assert_eq!(vectors[0].frequency, 1.0);
        assert_eq!(vectors[2].frequency, 0.0);
    }

    #[test]
    fn test_unparseable_timestamp_is_reported() {
        let tx = Transaction::new(1, 3001, 100.0, 10.0, "not-a-date", Some("A"));

        let err = FeatureExtractor::new().extract_one(&tx).unwrap_err();
        assert!(matches!(err, ScoringError::Parse { .. }));
    }

    #[test]
    fn test_missing_amount_is_filled() {
        let tx = Transaction::new(1, 3001, f64::NAN, 10.0, "2023-01-02 11:00:00", Some("A"));

        let vector = FeatureExtractor::new().extract_one(&tx).unwrap();

        assert_eq!(vector.amount, 0.0);
        assert_eq!(vector.total_transaction_amount, 0.0);
        assert_eq!(vector.rfms_score, 0.0);
        assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_frozen_extractor_keeps_training_scale() {
        let training = [
            Transaction::new(1, 1, 100.0, 10.0, "2023-01-01 10:00:00", Some("A")),
            Transaction::new(2, 2, 300.0, 30.0, "2023-01-05 14:00:00", Some("B")),
        ];
        let transformers = FrozenTransformers::fit(&training).unwrap();
        let extractor = FeatureExtractor::with_transformers(transformers)
            .with_fill_strategy(FillStrategy::Median);
        assert!(extractor.is_frozen());

        let tx = Transaction::new(9, 7, 200.0, 20.0, "2023-01-03 12:00:00", Some("B"));
        let vector = extractor.extract_one(&tx).unwrap();

        assert_eq!(vector.amount, 0.5);
        assert_eq!(vector.value, 0.5);
        assert_eq!(vector.pricing_strategy, 1.0);
        assert_eq!(vector.transaction_hour, 0.5);
    }

    #[test]
    fn test_empty_batch() {
        assert!(FeatureExtractor::new().extract(&[]).unwrap().is_empty());
    }
}

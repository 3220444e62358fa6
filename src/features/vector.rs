//! Feature vector layout shared by the pipeline and the model artifact

use serde::{Deserialize, Serialize};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 15;

/// Canonical feature order. A model artifact must list exactly these names,
/// in this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Amount",
    "Value",
    "PricingStrategy",
    "Transaction_Hour",
    "Transaction_Day",
    "Transaction_Month",
    "Transaction_Year",
    "Total_Transaction_Amount",
    "Average_Transaction_Amount",
    "Transaction_Count",
    "Recency",
    "Frequency",
    "Monetary",
    "RFMS_Score",
    "RFMS_Binned",
];

/// Leading columns rescaled by the min-max normalizer.
pub const NORMALIZED_COLUMN_COUNT: usize = 10;

/// One transaction's model input.
///
/// Identifiers and the raw timestamp are not part of the vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureVector {
    pub amount: f64,
    pub value: f64,
    pub pricing_strategy: f64,
    #[serde(rename = "Transaction_Hour")]
    pub transaction_hour: f64,
    #[serde(rename = "Transaction_Day")]
    pub transaction_day: f64,
    #[serde(rename = "Transaction_Month")]
    pub transaction_month: f64,
    #[serde(rename = "Transaction_Year")]
    pub transaction_year: f64,
    #[serde(rename = "Total_Transaction_Amount")]
    pub total_transaction_amount: f64,
    #[serde(rename = "Average_Transaction_Amount")]
    pub average_transaction_amount: f64,
    #[serde(rename = "Transaction_Count")]
    pub transaction_count: f64,
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
    #[serde(rename = "RFMS_Score")]
    pub rfms_score: f64,
    #[serde(rename = "RFMS_Binned")]
    pub rfms_binned: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.amount,
            self.value,
            self.pricing_strategy,
            self.transaction_hour,
            self.transaction_day,
            self.transaction_month,
            self.transaction_year,
            self.total_transaction_amount,
            self.average_transaction_amount,
            self.transaction_count,
            self.recency,
            self.frequency,
            self.monetary,
            self.rfms_score,
            self.rfms_binned,
        ]
    }

    /// Mutable references in [`FEATURE_NAMES`] order.
    pub fn values_mut(&mut self) -> [&mut f64; FEATURE_COUNT] {
        [
            &mut self.amount,
            &mut self.value,
            &mut self.pricing_strategy,
            &mut self.transaction_hour,
            &mut self.transaction_day,
            &mut self.transaction_month,
            &mut self.transaction_year,
            &mut self.total_transaction_amount,
            &mut self.average_transaction_amount,
            &mut self.transaction_count,
            &mut self.recency,
            &mut self.frequency,
            &mut self.monetary,
            &mut self.rfms_score,
            &mut self.rfms_binned,
        ]
    }

    /// Look up a feature by its schema name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values()[i])
    }

    /// Model input as `f32`, the element type ONNX exports expect.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values().iter().map(|&v| v as f32).collect()
    }
}

/// Check an artifact's feature list against the canonical schema, returning
/// a description of the first difference.
pub fn check_schema(names: &[String]) -> Result<(), String> {
    if names.len() != FEATURE_COUNT {
        return Err(format!(
            "expected {} features, artifact lists {}",
            FEATURE_COUNT,
            names.len()
        ));
    }
    for (i, (expected, actual)) in FEATURE_NAMES.iter().zip(names).enumerate() {
        if expected != actual {
            return Err(format!(
                "feature {} is {:?}, expected {:?}",
                i, actual, expected
            ));
        }
    }
    Ok(())
}

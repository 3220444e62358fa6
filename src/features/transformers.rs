//! Fitted preprocessing parameters
//!
//! [`FrozenTransformers`] bundles everything the pipeline learns from data:
//! the `PricingStrategy` label mapping and its most frequent label, the
//! min-max bounds of the numeric columns and the RFMS bounds. Fit once on
//! training data and stored in the model artifact, they make inference
//! independent of the batch being scored. Fit on the request batch itself
//! they reproduce per-request refitting.

use super::aggregate::aggregate_by_customer;
use super::encoder::LabelEncoder;
use super::imputer::{fill_numeric, impute_labels, most_frequent, observed_labels, FillStrategy};
use super::normalizer::MinMaxScaler;
use super::rfms::{rfms_inputs, RfmsBounds, RfmsInputs};
use super::temporal::TemporalFeatures;
use super::vector::FeatureVector;
use crate::error::{ScoringError, ScoringResult};
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenTransformers {
    /// Label mapping for `PricingStrategy`
    pub pricing_strategy: LabelEncoder,
    /// Substitute for a blank `PricingStrategy`
    pub pricing_strategy_mode: String,
    /// Bounds of the normalized numeric columns
    pub scaler: MinMaxScaler,
    /// Bounds of the RFMS sub-scores and composite score
    pub rfms: RfmsBounds,
}

/// A transaction after imputation, aggregation and temporal extraction.
/// `features` holds raw values; encoding and scaling come later.
struct StagedRow {
    customer_id: i64,
    label: String,
    features: FeatureVector,
}

impl FrozenTransformers {
    /// Learn all preprocessing parameters from `batch`.
    pub fn fit(batch: &[Transaction]) -> ScoringResult<Self> {
        let mode = most_frequent(observed_labels(batch)).ok_or_else(|| {
            ScoringError::validation("PricingStrategy", "no observed label to fit the encoder on")
        })?;

        let mut rows = stage_rows(batch, Some(&mode))?;
        let rfms = RfmsBounds::fit(&staged_rfms_inputs(&rows));

        let encoder = LabelEncoder::fit(rows.iter().map(|row| row.label.as_str()));
        encode_labels(&mut rows, &encoder)?;

        let features: Vec<FeatureVector> = rows.iter().map(|row| row.features).collect();
        let scaler = MinMaxScaler::fit(&features);

        Ok(Self {
            pricing_strategy: encoder,
            pricing_strategy_mode: mode,
            scaler,
            rfms,
        })
    }

    /// Apply the fitted parameters to `batch`, producing one feature vector
    /// per transaction in input order.
    pub fn transform(
        &self,
        batch: &[Transaction],
        fill: FillStrategy,
    ) -> ScoringResult<Vec<FeatureVector>> {
        let mut rows = stage_rows(batch, Some(&self.pricing_strategy_mode))?;
        let inputs = staged_rfms_inputs(&rows);
        encode_labels(&mut rows, &self.pricing_strategy)?;

        let mut vectors: Vec<FeatureVector> = rows
            .into_iter()
            .zip(&inputs)
            .map(|(row, inputs)| {
                let mut vector = row.features;
                self.scaler.transform(&mut vector);

                let scores = self.rfms.compose(inputs);
                vector.recency = scores.recency;
                vector.frequency = scores.frequency;
                vector.monetary = scores.monetary;
                vector.rfms_score = scores.score;
                vector
            })
            .collect();

        fill_numeric(&mut vectors, fill);

        for vector in &mut vectors {
            vector.rfms_binned = self.rfms.bin(vector.rfms_score) as f64;
        }

        Ok(vectors)
    }

    /// Check internal consistency, describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.pricing_strategy.is_empty() {
            return Err("PricingStrategy encoder has no classes".to_string());
        }
        if !self.pricing_strategy.is_well_formed() {
            return Err("PricingStrategy classes must be sorted and distinct".to_string());
        }
        if self.pricing_strategy.encode(&self.pricing_strategy_mode).is_err() {
            return Err(format!(
                "PricingStrategy mode {:?} is not a known class",
                self.pricing_strategy_mode
            ));
        }
        let missing = self.scaler.missing_columns();
        if !missing.is_empty() {
            return Err(format!("scaler has no bounds for {:?}", missing));
        }
        Ok(())
    }
}

/// Impute labels, aggregate by customer, extract calendar fields and merge
/// them into raw per-row features.
fn stage_rows(batch: &[Transaction], mode: Option<&str>) -> ScoringResult<Vec<StagedRow>> {
    let labels = impute_labels(batch, mode)?;
    let aggregates: HashMap<i64, _> = aggregate_by_customer(batch)
        .into_iter()
        .map(|aggregate| (aggregate.customer_id, aggregate))
        .collect();

    batch
        .iter()
        .zip(labels)
        .map(|(tx, label)| {
            let temporal = TemporalFeatures::extract(&tx.transaction_start_time)?;
            let (total, average, count) = aggregates
                .get(&tx.customer_id)
                .map(|a| {
                    (
                        a.total_transaction_amount,
                        a.average_transaction_amount,
                        a.transaction_count as f64,
                    )
                })
                .unwrap_or((tx.amount, tx.amount, 1.0));

            Ok(StagedRow {
                customer_id: tx.customer_id,
                label,
                features: FeatureVector {
                    amount: tx.amount,
                    value: tx.value,
                    transaction_hour: temporal.hour as f64,
                    transaction_day: temporal.day as f64,
                    transaction_month: temporal.month as f64,
                    transaction_year: temporal.year as f64,
                    total_transaction_amount: total,
                    average_transaction_amount: average,
                    transaction_count: count,
                    ..Default::default()
                },
            })
        })
        .collect()
}

/// RFMS inputs from the raw (pre-normalization) year, count and total.
fn staged_rfms_inputs(rows: &[StagedRow]) -> Vec<RfmsInputs> {
    let raw: Vec<(i64, f64, f64, f64)> = rows
        .iter()
        .map(|row| {
            (
                row.customer_id,
                row.features.transaction_year,
                row.features.transaction_count,
                row.features.total_transaction_amount,
            )
        })
        .collect();
    rfms_inputs(&raw)
}

fn encode_labels(rows: &mut [StagedRow], encoder: &LabelEncoder) -> ScoringResult<()> {
    for row in rows {
        row.features.pricing_strategy = encoder.encode(&row.label)? as f64;
    }
    Ok(())
}

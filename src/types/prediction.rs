//! Prediction results returned to the submitter

use super::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of a single predictor call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class (1 = fraud)
    pub label: i64,
    /// Positive-class probability, when the predictor exposes one
    pub score: Option<f64>,
}

/// Response body for a scored transaction: the submitted fields plus the
/// predicted label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResponse {
    /// Unique identifier of this scoring request
    pub request_id: String,

    /// Echo of the validated submission
    pub transaction: Transaction,

    /// Predicted label
    pub prediction: i64,

    /// Positive-class probability, if available
    pub score: Option<f64>,

    /// Time the prediction was produced
    pub scored_at: DateTime<Utc>,
}

impl ScoringResponse {
    pub fn new(transaction: Transaction, prediction: Prediction) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            transaction,
            prediction: prediction.label,
            score: prediction.score,
            scored_at: Utc::now(),
        }
    }
}

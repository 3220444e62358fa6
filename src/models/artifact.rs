//! Serialized model artifact
//!
//! The artifact is a JSON document binding a predictor to the feature
//! schema and, optionally, to the preprocessing parameters fit alongside it:
//!
//! ```json
//! {
//!   "feature_names": ["Amount", "Value", "..."],
//!   "transformers": { "pricing_strategy": { "classes": ["A", "B"] }, "...": {} },
//!   "predictor": { "type": "logistic", "coefficients": [0.4, "..."], "intercept": -1.2 }
//! }
//! ```

use super::predictor::{LogisticPredictor, Predictor};
use crate::error::{ScoringError, ScoringResult};
use crate::features::vector::{check_schema, FEATURE_COUNT};
use crate::features::FrozenTransformers;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_threshold() -> f64 {
    0.5
}

/// How the classifier itself is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PredictorSpec {
    /// Inline logistic regression parameters
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// ONNX model file, relative to the artifact's directory
    Onnx { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature order the predictor was fit on
    pub feature_names: Vec<String>,
    /// Preprocessing parameters fit on the training data
    #[serde(default)]
    pub transformers: Option<FrozenTransformers>,
    pub predictor: PredictorSpec,
}

impl ModelArtifact {
    /// Deserialize and validate an artifact.
    pub fn from_slice(bytes: &[u8]) -> ScoringResult<Self> {
        let artifact: Self = serde_json::from_slice(bytes)
            .map_err(|e| ScoringError::ModelInvalid(format!("malformed artifact: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> ScoringResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ScoringError::ModelInvalid(format!("cannot serialize artifact: {}", e)))
    }

    /// Check the schema contract and the internal consistency of the parts.
    pub fn validate(&self) -> ScoringResult<()> {
        check_schema(&self.feature_names)
            .map_err(|e| ScoringError::ModelInvalid(format!("feature schema mismatch: {}", e)))?;

        if let Some(transformers) = &self.transformers {
            transformers
                .validate()
                .map_err(|e| ScoringError::ModelInvalid(format!("transformers: {}", e)))?;
        }

        if let PredictorSpec::Logistic { coefficients, .. } = &self.predictor {
            if coefficients.len() != FEATURE_COUNT {
                return Err(ScoringError::ModelInvalid(format!(
                    "logistic predictor has {} coefficients for {} features",
                    coefficients.len(),
                    FEATURE_COUNT
                )));
            }
        }
        Ok(())
    }

    /// Instantiate the predictor. `base_dir` resolves relative model paths.
    pub fn build_predictor(
        &self,
        base_dir: &Path,
        onnx_threads: usize,
    ) -> ScoringResult<Box<dyn Predictor>> {
        match &self.predictor {
            PredictorSpec::Logistic {
                coefficients,
                intercept,
                threshold,
            } => Ok(Box::new(LogisticPredictor::new(
                coefficients.clone(),
                *intercept,
                *threshold,
            )?)),
            PredictorSpec::Onnx { path } => build_onnx(&base_dir.join(path), onnx_threads),
        }
    }
}

#[cfg(feature = "onnx")]
fn build_onnx(path: &Path, threads: usize) -> ScoringResult<Box<dyn Predictor>> {
    if !path.exists() {
        return Err(ScoringError::ModelUnavailable(format!(
            "ONNX model {} not found",
            path.display()
        )));
    }
    Ok(Box::new(super::predictor::OnnxPredictor::load(path, threads)?))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx(path: &Path, _threads: usize) -> ScoringResult<Box<dyn Predictor>> {
    Err(ScoringError::ModelInvalid(format!(
        "artifact references ONNX model {} but ONNX support is not compiled in",
        path.display()
    )))
}

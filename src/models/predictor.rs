//! Predictor implementations

use crate::error::{ScoringError, ScoringResult};
use crate::types::prediction::Prediction;

/// A fitted classifier.
///
/// Implementations are shared read-only across request handlers.
pub trait Predictor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Number of input features the predictor was fit on
    fn input_width(&self) -> Option<usize>;

    /// Classify one feature row, given in schema order.
    fn predict(&self, features: &[f32]) -> ScoringResult<Prediction>;
}

/// Logistic regression classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticPredictor {
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticPredictor {
    pub fn new(coefficients: Vec<f64>, intercept: f64, threshold: f64) -> ScoringResult<Self> {
        if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
            return Err(ScoringError::ModelInvalid(
                "logistic coefficients must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ScoringError::ModelInvalid(format!(
                "decision threshold {} outside [0, 1]",
                threshold
            )));
        }
        Ok(Self {
            coefficients,
            intercept,
            threshold,
        })
    }
}

impl Predictor for LogisticPredictor {
    fn name(&self) -> &str {
        "logistic"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f32]) -> ScoringResult<Prediction> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::Prediction(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let logit = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, &x)| acc + w * x as f64);
        let probability = 1.0 / (1.0 + (-logit).exp());

        if !probability.is_finite() {
            return Err(ScoringError::Prediction(
                "predictor produced a non-finite probability".to_string(),
            ));
        }

        Ok(Prediction {
            label: i64::from(probability >= self.threshold),
            score: Some(probability),
        })
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPredictor;

#[cfg(feature = "onnx")]
mod onnx {
    use super::Predictor;
    use crate::error::{ScoringError, ScoringResult};
    use crate::types::prediction::Prediction;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::{debug, info};

    /// Classifier exported to ONNX (e.g. an XGBoost model via onnxmltools).
    ///
    /// Expects a `[1, n]` float input; reads the predicted class from the
    /// `label` output and the positive-class probability from the
    /// probabilities output when it is a plain tensor.
    pub struct OnnxPredictor {
        /// Running a session needs exclusive access
        session: Mutex<Session>,
        input_name: String,
        label_output: String,
        probability_output: Option<String>,
    }

    impl OnnxPredictor {
        pub fn load(path: &Path, threads: usize) -> ScoringResult<Self> {
            let invalid = |e: ort::Error| {
                ScoringError::ModelInvalid(format!("{}: {}", path.display(), e))
            };

            ort::init().commit().map_err(invalid)?;

            let session = Session::builder()
                .map_err(invalid)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(invalid)?
                .with_intra_threads(threads)
                .map_err(invalid)?
                .commit_from_file(path)
                .map_err(invalid)?;

            let input_name = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "float_input".to_string());

            let label_output = session
                .outputs
                .iter()
                .find(|o| o.name.contains("label"))
                .or_else(|| session.outputs.first())
                .map(|o| o.name.clone())
                .ok_or_else(|| {
                    ScoringError::ModelInvalid(format!("{} declares no outputs", path.display()))
                })?;

            let probability_output = session
                .outputs
                .iter()
                .find(|o| o.name.contains("prob"))
                .map(|o| o.name.clone());

            info!(
                path = %path.display(),
                input = %input_name,
                label_output = %label_output,
                probability_output = ?probability_output,
                "ONNX model loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                label_output,
                probability_output,
            })
        }
    }

    impl Predictor for OnnxPredictor {
        fn name(&self) -> &str {
            "onnx"
        }

        fn input_width(&self) -> Option<usize> {
            None
        }

        fn predict(&self, features: &[f32]) -> ScoringResult<Prediction> {
            let failed = |e: ort::Error| ScoringError::Prediction(e.to_string());

            let shape = vec![1_i64, features.len() as i64];
            let input = Tensor::from_array((shape, features.to_vec())).map_err(failed)?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| ScoringError::Prediction(format!("Lock error: {}", e)))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(failed)?;

            let label_value = outputs.get(self.label_output.as_str()).ok_or_else(|| {
                ScoringError::Prediction(format!("missing output {}", self.label_output))
            })?;
            let label = match label_value.try_extract_tensor::<i64>() {
                Ok((_, data)) => data.first().copied(),
                Err(_) => label_value
                    .try_extract_tensor::<f32>()
                    .ok()
                    .and_then(|(_, data)| data.first().map(|&v| v.round() as i64)),
            }
            .ok_or_else(|| ScoringError::Prediction("empty label output".to_string()))?;

            // seq(map) probability outputs are skipped; only plain tensors are read
            let score = self
                .probability_output
                .as_deref()
                .and_then(|name| outputs.get(name))
                .and_then(|value| value.try_extract_tensor::<f32>().ok())
                .and_then(|(_, data)| data.get(1).or_else(|| data.first()).copied())
                .map(f64::from);

            debug!(label = label, score = ?score, "ONNX inference complete");

            Ok(Prediction { label, score })
        }
    }
}

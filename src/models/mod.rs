//! Model artifact handling and inference components

pub mod artifact;
pub mod inference;
pub mod loader;
pub mod predictor;
pub mod registry;

pub use artifact::{ModelArtifact, PredictorSpec};
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use predictor::{LogisticPredictor, Predictor};
pub use registry::ModelHandle;

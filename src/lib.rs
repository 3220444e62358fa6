//! Fraud Scoring Service Library
//!
//! Scores single payment transactions: a fifteen-column feature pipeline,
//! a load-once model artifact and an HTTP form endpoint.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod features;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{ScoringError, ScoringResult};
pub use feature_extractor::FeatureExtractor;
pub use models::{InferenceEngine, ModelHandle, ModelLoader};
pub use types::{prediction::Prediction, transaction::Transaction};

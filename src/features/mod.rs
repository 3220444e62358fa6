//! Feature engineering stages
//!
//! Each stage is usable on its own; [`crate::FeatureExtractor`] chains them
//! into the full pipeline.

pub mod aggregate;
pub mod encoder;
pub mod imputer;
pub mod normalizer;
pub mod rfms;
pub mod temporal;
pub mod transformers;
pub mod vector;

pub use aggregate::{aggregate_by_customer, CustomerAggregate};
pub use encoder::LabelEncoder;
pub use imputer::FillStrategy;
pub use normalizer::{Bounds, MinMaxScaler};
pub use rfms::{RfmsBounds, RFMS_BINS};
pub use temporal::TemporalFeatures;
pub use transformers::FrozenTransformers;
pub use vector::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

//! Type definitions for the scoring service

pub mod prediction;
pub mod transaction;

pub use prediction::{Prediction, ScoringResponse};
pub use transaction::{Transaction, TransactionForm};

//! Error taxonomy for transaction scoring

use thiserror::Error;

/// Errors raised while validating, preprocessing or scoring a transaction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// A submitted field is missing or malformed
    #[error("invalid field {field}: {reason}")]
    Validation { field: String, reason: String },

    /// TransactionStartTime is not a recognized timestamp
    #[error("could not parse TransactionStartTime {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// The model artifact could not be obtained
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model artifact is corrupt or incompatible with the feature schema
    #[error("model artifact invalid: {0}")]
    ModelInvalid(String),

    /// The predictor failed on the supplied features
    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl ScoringError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable identifier, used in responses and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Parse { .. } => "parse",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::ModelInvalid(_) => "model_invalid",
            Self::Prediction(_) => "prediction",
        }
    }

    /// Name of the offending form field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::Parse { .. } => Some("TransactionStartTime"),
            _ => None,
        }
    }

    /// Whether the submitter (rather than the service) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Parse { .. })
    }
}

pub type ScoringResult<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ScoringError::validation("Amount", "bad").kind(), "validation");
        assert_eq!(ScoringError::ModelInvalid("x".into()).kind(), "model_invalid");
        assert_eq!(ScoringError::Prediction("x".into()).kind(), "prediction");
    }

    #[test]
    fn test_parse_error_points_at_timestamp_field() {
        let err = ScoringError::Parse {
            value: "not-a-date".to_string(),
            reason: "unrecognized format".to_string(),
        };
        assert_eq!(err.field(), Some("TransactionStartTime"));
        assert!(err.is_client_error());
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn test_model_errors_are_not_client_errors() {
        assert!(!ScoringError::ModelUnavailable("gone".into()).is_client_error());
        assert_eq!(ScoringError::ModelUnavailable("gone".into()).field(), None);
    }
}

//! Label encoding for `PricingStrategy`

use crate::error::{ScoringError, ScoringResult};
use serde::{Deserialize, Serialize};

/// Maps category labels to integer codes by their lexicographic rank.
///
/// Fitted on a single-row batch every label encodes to 0; persist the
/// encoder fitted on training data to get stable codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Sorted, distinct labels; a label's code is its index
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = labels.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Code of `label`; unseen labels are rejected.
    pub fn encode(&self, label: &str) -> ScoringResult<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map_err(|_| {
                ScoringError::validation(
                    "PricingStrategy",
                    format!("unknown label {label:?}, expected one of {:?}", self.classes),
                )
            })
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Whether the classes are sorted and distinct, as `encode` requires.
    pub fn is_well_formed(&self) -> bool {
        self.classes.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["B", "A", "C", "A", "B"]);

        assert_eq!(encoder.classes, vec!["A", "B", "C"]);
        assert_eq!(encoder.encode("A").unwrap(), 0);
        assert_eq!(encoder.encode("B").unwrap(), 1);
        assert_eq!(encoder.encode("C").unwrap(), 2);
    }

    #[test]
    fn test_single_label_encodes_to_zero() {
        let encoder = LabelEncoder::fit(["4"]);
        assert_eq!(encoder.encode("4").unwrap(), 0);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let encoder = LabelEncoder::fit(["A", "B"]);
        let err = encoder.encode("Z").unwrap_err();

        assert_eq!(err.field(), Some("PricingStrategy"));
    }

    #[test]
    fn test_well_formed() {
        assert!(LabelEncoder::fit(["b", "a"]).is_well_formed());

        let unsorted = LabelEncoder {
            classes: vec!["b".into(), "a".into()],
        };
        assert!(!unsorted.is_well_formed());
    }
}

//! Missing-value handling

use super::vector::{FeatureVector, FEATURE_COUNT};
use crate::error::{ScoringError, ScoringResult};
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How non-finite numeric features are replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Replace with 0.0
    #[default]
    Zero,
    /// Replace with the batch median of the column's finite values (0.0 if none)
    Median,
}

/// Most frequent label; ties go to the lexicographically smallest.
pub fn most_frequent<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    // BTreeMap iterates in key order, so the first maximum wins ties
    counts
        .into_iter()
        .fold(None::<(&str, usize)>, |best, (label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label.to_string())
}

/// Observed `PricingStrategy` labels of a batch.
pub fn observed_labels<'a>(batch: &'a [Transaction]) -> impl Iterator<Item = &'a str> + 'a {
    batch.iter().filter_map(|tx| tx.pricing_strategy.as_deref())
}

/// Resolve every row's `PricingStrategy`, substituting `mode` for blanks.
pub fn impute_labels(batch: &[Transaction], mode: Option<&str>) -> ScoringResult<Vec<String>> {
    batch
        .iter()
        .map(|tx| match (tx.pricing_strategy.as_deref(), mode) {
            (Some(label), _) => Ok(label.to_string()),
            (None, Some(mode)) => Ok(mode.to_string()),
            (None, None) => Err(ScoringError::validation(
                "PricingStrategy",
                "missing value and no observed label to impute from",
            )),
        })
        .collect()
}

/// Replace non-finite feature values column by column.
pub fn fill_numeric(rows: &mut [FeatureVector], strategy: FillStrategy) {
    for column in 0..FEATURE_COUNT {
        let replacement = match strategy {
            FillStrategy::Zero => 0.0,
            FillStrategy::Median => {
                median(rows.iter().map(|row| row.values()[column])).unwrap_or(0.0)
            }
        };

        for row in rows.iter_mut() {
            if let Some(value) = row.values_mut().into_iter().nth(column) {
                if !value.is_finite() {
                    *value = replacement;
                }
            }
        }
    }
}

/// Median of the finite values.
fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent() {
        assert_eq!(most_frequent(["B", "A", "B"]), Some("B".to_string()));
        // Tie between A and B
        assert_eq!(most_frequent(["B", "A", "C", "A", "B"]), Some("A".to_string()));
        assert_eq!(most_frequent(std::iter::empty()), None);
    }

    #[test]
    fn test_impute_labels() {
        let batch = [
            Transaction::new(1, 1, 10.0, 1.0, "2023-01-01", Some("2")),
            Transaction::new(2, 1, 10.0, 1.0, "2023-01-01", None),
        ];

        assert_eq!(impute_labels(&batch, Some("4")).unwrap(), vec!["2", "4"]);

        let err = impute_labels(&batch, None).unwrap_err();
        assert_eq!(err.field(), Some("PricingStrategy"));
    }

    #[test]
    fn test_zero_fill() {
        let mut rows = [FeatureVector {
            amount: f64::NAN,
            value: 3.0,
            rfms_score: f64::INFINITY,
            ..Default::default()
        }];

        fill_numeric(&mut rows, FillStrategy::Zero);

        assert_eq!(rows[0].amount, 0.0);
        assert_eq!(rows[0].value, 3.0);
        assert_eq!(rows[0].rfms_score, 0.0);
    }

    #[test]
    fn test_median_fill() {
        let mut rows = [
            FeatureVector {
                amount: 1.0,
                ..Default::default()
            },
            FeatureVector {
                amount: f64::NAN,
                ..Default::default()
            },
            FeatureVector {
                amount: 5.0,
                ..Default::default()
            },
            FeatureVector {
                amount: 4.0,
                ..Default::default()
            },
        ];

        fill_numeric(&mut rows, FillStrategy::Median);

        assert_eq!(rows[1].amount, 4.0);
        assert_eq!(rows[0].amount, 1.0);
    }

    #[test]
    fn test_median_fill_without_finite_values_uses_zero() {
        let mut rows = [FeatureVector {
            value: f64::NAN,
            ..Default::default()
        }];

        fill_numeric(&mut rows, FillStrategy::Median);
        assert_eq!(rows[0].value, 0.0);
    }

    #[test]
    fn test_fill_strategy_config_names() {
        let strategy: FillStrategy = serde_json::from_str("\"median\"").unwrap();
        assert_eq!(strategy, FillStrategy::Median);
        assert_eq!(FillStrategy::default(), FillStrategy::Zero);
    }
}

//! Min-max normalization of numeric feature columns

use super::vector::{FeatureVector, FEATURE_NAMES, NORMALIZED_COLUMN_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed range of one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Range of the finite values; `{0, 0}` when there are none.
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Bounds>, v| {
                Some(match acc {
                    Some(b) => Bounds {
                        min: b.min.min(v),
                        max: b.max.max(v),
                    },
                    None => Bounds { min: v, max: v },
                })
            })
            .unwrap_or_default()
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Rescale `x` into `[0, 1]` relative to these bounds.
    ///
    /// A zero-width range divides by 1, so the fitted value maps to 0.0.
    /// Non-finite input stays non-finite for the filler to handle.
    pub fn scale(&self, x: f64) -> f64 {
        let range = self.range();
        let divisor = if range == 0.0 || !range.is_finite() {
            1.0
        } else {
            range
        };
        (x - self.min) / divisor
    }
}

/// Per-column bounds for the leading numeric columns of the feature vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Bounds keyed by schema column name
    pub columns: BTreeMap<String, Bounds>,
}

impl MinMaxScaler {
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let columns = FEATURE_NAMES[..NORMALIZED_COLUMN_COUNT]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let bounds = Bounds::fit(rows.iter().map(|row| row.values()[i]));
                (name.to_string(), bounds)
            })
            .collect();
        Self { columns }
    }

    /// Rescale the normalized columns of `row` in place.
    pub fn transform(&self, row: &mut FeatureVector) {
        let names = &FEATURE_NAMES[..NORMALIZED_COLUMN_COUNT];
        for (name, value) in names.iter().zip(row.values_mut()) {
            if let Some(bounds) = self.columns.get(*name) {
                *value = bounds.scale(*value);
            }
        }
    }

    /// Names of normalized columns without bounds.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        FEATURE_NAMES[..NORMALIZED_COLUMN_COUNT]
            .iter()
            .copied()
            .filter(|name| !self.columns.contains_key(*name))
            .collect()
    }
}

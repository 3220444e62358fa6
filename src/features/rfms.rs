//! Recency / Frequency / Monetary composite score

use super::normalizer::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of ordinal buckets for `RFMS_Binned`.
pub const RFMS_BINS: u32 = 5;

/// Raw RFMS inputs for one row, taken before normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmsInputs {
    /// Latest transaction year of the row's customer
    pub recency: f64,
    /// Customer transaction count
    pub frequency: f64,
    /// Customer total amount
    pub monetary: f64,
}

/// Normalized sub-scores and their unweighted mean
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmsScores {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
    pub score: f64,
}

/// Build RFMS inputs from `(customer_id, year, count, total)` rows; recency
/// is the customer's maximum year across the batch.
pub fn rfms_inputs(rows: &[(i64, f64, f64, f64)]) -> Vec<RfmsInputs> {
    let mut latest_year: HashMap<i64, f64> = HashMap::new();
    for &(customer_id, year, _, _) in rows {
        latest_year
            .entry(customer_id)
            .and_modify(|y| *y = y.max(year))
            .or_insert(year);
    }

    rows.iter()
        .map(|&(customer_id, year, count, total)| RfmsInputs {
            recency: latest_year.get(&customer_id).copied().unwrap_or(year),
            frequency: count,
            monetary: total,
        })
        .collect()
}

/// Normalization bounds for each sub-score and for the composite score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RfmsBounds {
    pub recency: Bounds,
    pub frequency: Bounds,
    pub monetary: Bounds,
    /// Range binned into [`RFMS_BINS`] equal-width buckets
    pub score: Bounds,
}

impl RfmsBounds {
    pub fn fit(inputs: &[RfmsInputs]) -> Self {
        let mut bounds = Self {
            recency: Bounds::fit(inputs.iter().map(|i| i.recency)),
            frequency: Bounds::fit(inputs.iter().map(|i| i.frequency)),
            monetary: Bounds::fit(inputs.iter().map(|i| i.monetary)),
            score: Bounds::default(),
        };
        let score = Bounds::fit(inputs.iter().map(|i| bounds.compose(i).score));
        bounds.score = score;
        bounds
    }

    pub fn compose(&self, inputs: &RfmsInputs) -> RfmsScores {
        let recency = self.recency.scale(inputs.recency);
        let frequency = self.frequency.scale(inputs.frequency);
        let monetary = self.monetary.scale(inputs.monetary);
        RfmsScores {
            recency,
            frequency,
            monetary,
            score: (recency + frequency + monetary) / 3.0,
        }
    }

    /// Bucket of `score` among [`RFMS_BINS`] equal-width bins over the score
    /// range.
    pub fn bin(&self, score: f64) -> u32 {
        bin_uniform(score, self.score, RFMS_BINS)
    }
}

/// Absolute and relative slack added to a value before it is compared with
/// the bin edges, so a value on an edge lands in the upper bin.
const EDGE_ATOL: f64 = 1e-8;
const EDGE_RTOL: f64 = 1e-5;

/// Equal-width discretization over `bounds`. Values below the range land in
/// the first bin and values at or above the top in the last. A zero-width
/// range or a non-finite value yields bin 0.
pub fn bin_uniform(value: f64, bounds: Bounds, bins: u32) -> u32 {
    let width = bounds.range();
    if bins == 0 || !value.is_finite() || !(width > 0.0) || !width.is_finite() {
        return 0;
    }
    let step = width / bins as f64;
    let shifted = value + EDGE_ATOL + EDGE_RTOL * value.abs();
    let passed = (1..bins)
        .take_while(|&k| bounds.min + k as f64 * step <= shifted)
        .count() as u32;
    passed.min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_is_customer_max_year() {
        let rows = [
            (1, 2018.0, 2.0, 50.0),
            (2, 2019.0, 1.0, 10.0),
            (1, 2020.0, 2.0, 50.0),
        ];

        let inputs = rfms_inputs(&rows);

        assert_eq!(inputs[0].recency, 2020.0);
        assert_eq!(inputs[1].recency, 2019.0);
        assert_eq!(inputs[2].recency, 2020.0);
        assert_eq!(inputs[0].frequency, 2.0);
        assert_eq!(inputs[1].monetary, 10.0);
    }

    #[test]
    fn test_single_row_scores_zero() {
        let inputs = rfms_inputs(&[(3001, 2023.0, 1.0, 100.0)]);
        let bounds = RfmsBounds::fit(&inputs);
        let scores = bounds.compose(&inputs[0]);

        assert_eq!(scores.score, 0.0);
        assert_eq!(bounds.bin(scores.score), 0);
    }

    #[test]
    fn test_score_is_unweighted_mean() {
        let inputs = [
            RfmsInputs {
                recency: 2020.0,
                frequency: 1.0,
                monetary: 0.0,
            },
            RfmsInputs {
                recency: 2022.0,
                frequency: 3.0,
                monetary: 90.0,
            },
        ];
        let bounds = RfmsBounds::fit(&inputs);

        let top = bounds.compose(&inputs[1]);
        assert_eq!(top.recency, 1.0);
        assert_eq!(top.frequency, 1.0);
        assert_eq!(top.monetary, 1.0);
        assert_eq!(top.score, 1.0);
        assert_eq!(bounds.score, Bounds { min: 0.0, max: 1.0 });
    }

    #[test]
    fn test_bins_are_equal_width() {
        let bounds = Bounds { min: 0.0, max: 1.0 };

        assert_eq!(bin_uniform(0.0, bounds, 5), 0);
        assert_eq!(bin_uniform(0.19, bounds, 5), 0);
        assert_eq!(bin_uniform(0.2, bounds, 5), 1);
        assert_eq!(bin_uniform(0.5, bounds, 5), 2);
        assert_eq!(bin_uniform(0.79, bounds, 5), 3);
        assert_eq!(bin_uniform(1.0, bounds, 5), 4);
        assert_eq!(bin_uniform(7.0, bounds, 5), 4);
        assert_eq!(bin_uniform(-3.0, bounds, 5), 0);
    }

    #[test]
    fn test_values_on_bin_edges_land_in_upper_bin() {
        let ranges = [
            (0.0, 1.0),
            (0.1, 0.45),
            (0.0, 0.7),
            (0.18572, 0.89147),
            (-1.0, 2.0),
            (0.0, 1.0 / 3.0),
        ];

        for (min, max) in ranges {
            let bounds = Bounds { min, max };
            for k in 1..RFMS_BINS {
                let edge = min + (max - min) * k as f64 / RFMS_BINS as f64;
                assert_eq!(bin_uniform(edge, bounds, RFMS_BINS), k, "edge {edge} of {bounds:?}");

                let below = edge - (max - min) * 1e-3;
                assert_eq!(bin_uniform(below, bounds, RFMS_BINS), k - 1, "below {edge}");
            }
        }
    }

    #[test]
    fn test_degenerate_bins() {
        let flat = Bounds { min: 0.4, max: 0.4 };
        assert_eq!(bin_uniform(0.4, flat, 5), 0);
        assert_eq!(bin_uniform(f64::NAN, Bounds { min: 0.0, max: 1.0 }, 5), 0);
    }
}

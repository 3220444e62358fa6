//! Request metrics and statistics tracking for the scoring service.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for scoring requests
pub struct ScoringMetrics {
    /// Requests received on the predict endpoint
    pub requests_received: AtomicU64,
    /// Requests that produced a prediction
    pub predictions_made: AtomicU64,
    /// Predictions by label
    predictions_by_label: RwLock<BTreeMap<i64, u64>>,
    /// Rejected requests by error kind
    rejections_by_kind: RwLock<BTreeMap<&'static str, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Positive-class probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ScoringMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            predictions_made: AtomicU64::new(0),
            predictions_by_label: RwLock::new(BTreeMap::new()),
            rejections_by_kind: RwLock::new(BTreeMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record an incoming request
    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, processing_time: Duration, label: i64, score: Option<f64>) {
        self.predictions_made.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_label) = self.predictions_by_label.write() {
            *by_label.entry(label).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Some(score) = score.filter(|s| s.is_finite()) {
            let bucket = (score.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
            if let Ok(mut buckets) = self.score_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a rejected request
    pub fn record_rejection(&self, kind: &'static str) {
        if let Ok(mut by_kind) = self.rejections_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_made.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests_received: self.requests_received.load(Ordering::Relaxed),
            predictions_made: self.predictions_made.load(Ordering::Relaxed),
            predictions_by_label: self
                .predictions_by_label
                .read()
                .map(|m| m.iter().map(|(k, v)| (k.to_string(), *v)).collect())
                .unwrap_or_default(),
            rejections_by_kind: self
                .rejections_by_kind
                .read()
                .map(|m| m.iter().map(|(k, v)| (k.to_string(), *v)).collect())
                .unwrap_or_default(),
            processing: self.get_processing_stats(),
            score_distribution: self.score_buckets.read().map(|b| *b).unwrap_or_default(),
            throughput: self.get_throughput(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let rejected: u64 = snapshot.rejections_by_kind.values().sum();

        info!(
            requests = snapshot.requests_received,
            predictions = snapshot.predictions_made,
            rejected = rejected,
            throughput = format!("{:.2} req/s", snapshot.throughput),
            "Scoring metrics summary"
        );
        info!(
            mean_us = snapshot.processing.mean_us,
            p50_us = snapshot.processing.p50_us,
            p95_us = snapshot.processing.p95_us,
            p99_us = snapshot.processing.p99_us,
            max_us = snapshot.processing.max_us,
            "Processing time"
        );
        for (label, count) in &snapshot.predictions_by_label {
            info!(label = %label, count = count, "Predictions by label");
        }
        for (kind, count) in &snapshot.rejections_by_kind {
            info!(kind = %kind, count = count, "Rejections by kind");
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of [`ScoringMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests_received: u64,
    pub predictions_made: u64,
    pub predictions_by_label: BTreeMap<String, u64>,
    pub rejections_by_kind: BTreeMap<String, u64>,
    pub processing: ProcessingStats,
    pub score_distribution: [u64; 10],
    pub throughput: f64,
}

/// Periodic summary logger
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScoringMetrics::new();

        metrics.record_request();
        metrics.record_request();
        metrics.record_request();
        metrics.record_prediction(Duration::from_micros(100), 0, Some(0.2));
        metrics.record_prediction(Duration::from_micros(300), 1, Some(0.95));
        metrics.record_rejection("parse");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_received, 3);
        assert_eq!(snapshot.predictions_made, 2);
        assert_eq!(snapshot.predictions_by_label.get("1"), Some(&1));
        assert_eq!(snapshot.rejections_by_kind.get("parse"), Some(&1));
        assert_eq!(snapshot.score_distribution[2], 1);
        assert_eq!(snapshot.score_distribution[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScoringMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), 0, None);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}

//! Test Transaction Submitter
//!
//! Generates random transactions and posts them to a running scoring
//! service as form submissions.

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    /// Generate a typical low-value purchase
    fn generate_legitimate(&mut self) -> Vec<(&'static str, String)> {
        let amount = self.rng.gen_range(100.0..5000.0_f64).round();
        let hours_ago = self.rng.gen_range(0..24 * 90);
        self.generate(amount, hours_ago)
    }

    /// Generate a large, odd-hour purchase
    fn generate_suspicious(&mut self) -> Vec<(&'static str, String)> {
        let amount = self.rng.gen_range(100_000.0..2_000_000.0_f64).round();
        let hours_ago = self.rng.gen_range(0..24 * 90) / 24 * 24 + self.rng.gen_range(0..5);
        self.generate(amount, hours_ago)
    }

    fn generate(&mut self, amount: f64, hours_ago: i64) -> Vec<(&'static str, String)> {
        self.transaction_counter += 1;
        let timestamp = Utc::now() - ChronoDuration::hours(hours_ago);
        // Refunds carry a negative amount but a positive value
        let amount = if self.rng.gen_bool(0.05) { -amount } else { amount };

        let pricing = if self.rng.gen_bool(0.05) {
            String::new()
        } else {
            self.random_choice(&["0", "1", "2", "4"]).to_string()
        };

        vec![
            ("TransactionId", self.transaction_counter.to_string()),
            ("BatchId", self.rng.gen_range(1..100_000).to_string()),
            ("AccountId", self.rng.gen_range(1..5000).to_string()),
            ("SubscriptionId", self.rng.gen_range(1..5000).to_string()),
            ("CustomerId", self.rng.gen_range(1..8000).to_string()),
            ("CurrencyCode", "UGX".to_string()),
            ("CountryCode", "256".to_string()),
            ("ProviderId", self.rng.gen_range(1..7).to_string()),
            ("ProductId", self.rng.gen_range(1..28).to_string()),
            (
                "ProductCategory",
                self.random_choice(&["airtime", "financial_services", "utility_bill", "tv"])
                    .to_string(),
            ),
            ("ChannelId", self.rng.gen_range(1..6).to_string()),
            ("Amount", amount.to_string()),
            ("Value", amount.abs().to_string()),
            (
                "TransactionStartTime",
                timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
            ("PricingStrategy", pricing),
        ]
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("submit_transactions=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Submitter");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://127.0.0.1:8080");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();
    let endpoint = format!("{}/predict", base_url.trim_end_matches('/'));

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    let mut flagged = 0;
    let mut rejected = 0;

    for i in 0..count {
        let form = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let response = client
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", endpoint))?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if status.is_success() {
            if body["prediction"].as_i64() == Some(1) {
                flagged += 1;
                info!(
                    transaction_id = %body["transaction"]["TransactionId"],
                    score = %body["score"],
                    "Transaction flagged"
                );
            }
        } else {
            rejected += 1;
            warn!(status = %status, body = %body, "Submission rejected");
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Submitted {}/{} transactions ({} flagged, {} rejected)",
                i + 1,
                count,
                flagged,
                rejected
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Submitted {} transactions ({} flagged, {} rejected)",
        count, flagged, rejected
    );

    Ok(())
}

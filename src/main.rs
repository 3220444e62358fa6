//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the model artifact and serves single-transaction predictions over
//! HTTP.

use anyhow::{Context, Result};
use fraud_scoring_service::{
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::{MetricsReporter, ScoringMetrics},
    models::{ModelHandle, ModelLoader},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    info!(
        bind = %config.server.bind_addr,
        model = %config.model.path.display(),
        remote = ?config.remote_url(),
        numeric_fill = ?config.preprocessing.numeric_fill,
        "Starting Fraud Scoring Service"
    );

    let loader = ModelLoader::new(config.model.clone(), config.preprocessing.clone())
        .context("Failed to initialize model loader")?;
    let model = Arc::new(ModelHandle::new(loader));

    // Load eagerly so the first request does not pay for it
    if let Err(e) = model.get().await {
        if config.model.fail_fast {
            return Err(e).context("Model could not be loaded at startup");
        }
        warn!(
            error = %e,
            "Serving without a model; each prediction request will retry the load"
        );
    }

    let metrics = Arc::new(ScoringMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = server::router(AppState::new(model, metrics.clone()));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    info!("Listening on http://{}", config.server.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Service shutting down...");
    metrics.print_summary();

    served.context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

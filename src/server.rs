//! HTTP surface: form submission in, JSON prediction out.

use crate::error::ScoringError;
use crate::metrics::ScoringMetrics;
use crate::models::ModelHandle;
use crate::types::{ScoringResponse, Transaction, TransactionForm};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHandle>,
    pub metrics: Arc<ScoringMetrics>,
}

impl AppState {
    pub fn new(model: Arc<ModelHandle>, metrics: Arc<ScoringMetrics>) -> Self {
        Self { model, metrics }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Error response body: `{error, kind, field?}`.
#[derive(Debug)]
pub struct ApiError(pub ScoringError);

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ScoringError::Validation { .. } | ScoringError::Parse { .. } => StatusCode::BAD_REQUEST,
            ScoringError::ModelUnavailable(_) | ScoringError::ModelInvalid(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ScoringError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        });
        if let Some(field) = self.0.field() {
            body["field"] = json!(field);
        }
        (self.status(), Json(body)).into_response()
    }
}

/// `POST /predict`: validate the form, score it, echo it back.
async fn predict(
    State(state): State<AppState>,
    form: Result<Form<TransactionForm>, FormRejection>,
) -> Result<Json<ScoringResponse>, ApiError> {
    let start = Instant::now();
    state.metrics.record_request();

    match score_form(&state, form).await {
        Ok(response) => {
            state
                .metrics
                .record_prediction(start.elapsed(), response.prediction, response.score);
            info!(
                request_id = %response.request_id,
                transaction_id = response.transaction.transaction_id,
                prediction = response.prediction,
                score = ?response.score,
                elapsed_us = start.elapsed().as_micros() as u64,
                "Transaction scored"
            );
            Ok(Json(response))
        }
        Err(err) => {
            state.metrics.record_rejection(err.kind());
            if err.is_client_error() {
                warn!(kind = err.kind(), field = ?err.field(), error = %err, "Rejected submission");
            } else {
                error!(kind = err.kind(), error = %err, "Scoring failed");
            }
            Err(err.into())
        }
    }
}

async fn score_form(
    state: &AppState,
    form: Result<Form<TransactionForm>, FormRejection>,
) -> Result<ScoringResponse, ScoringError> {
    let Form(form) = form.map_err(|e| ScoringError::validation("form", e.body_text()))?;
    let transaction = Transaction::try_from(form)?;

    let engine = state.model.get().await?;
    let prediction = engine.score(&transaction)?;

    Ok(ScoringResponse::new(transaction, prediction))
}

/// `GET /health`: liveness plus whether a model is loaded.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_loaded(),
    }))
}

/// `GET /metrics`
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

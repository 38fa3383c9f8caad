use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::data::SensorFrame;
use crate::error::PredictError;
use crate::types::HealthStatus;

use super::AppState;

// === Static endpoints ===

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "RUL prediction service is running" }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// === Introspection endpoints ===

pub async fn get_model_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "feature_cols": state.predictor.feature_cols(),
        "seq_len": state.predictor.seq_len(),
        "input_size": state.predictor.input_size(),
        "hidden_size": state.predictor.hidden_size(),
        "thresholds": { "healthy_above": 100.0, "monitor_above": 50.0 },
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let requests = state.stats.snapshot().await;
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(json!({
        "uptime_seconds": uptime,
        "requests": requests,
    }))
}

// === Prediction endpoint ===

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub rul: f64,
    pub status: HealthStatus,
    pub color: &'static str,
    pub cycles_analyzed: usize,
    pub rows_received: usize,
    pub last_cycle: Option<i64>,
}

pub async fn predict(State(state): State<AppState>, multipart: Multipart) -> Response {
    match run_predict(&state, multipart).await {
        Ok(resp) => {
            state.stats.record_accepted(resp.rul, resp.status).await;
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            state.stats.record_rejected().await;
            if e.status_code().is_server_error() {
                error!("Prediction failed: {}", e);
            } else {
                debug!("Rejected upload: {}", e);
            }
            e.into_response()
        }
    }
}

async fn run_predict(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<PredictResponse, PredictError> {
    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| PredictError::Multipart(e.to_string()))?
        {
            Some(f) if f.name() == Some("file") => break f,
            Some(_) => continue,
            None => return Err(PredictError::MissingFile),
        }
    };

    let filename = field.file_name().unwrap_or_default().to_string();
    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(PredictError::NotCsv);
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| PredictError::Multipart(e.to_string()))?;

    let frame = SensorFrame::from_csv_bytes(&bytes)?;
    let prediction = state.predictor.predict(&frame)?;

    info!(
        "Predicted RUL {:.2} ({}) from {} rows of {}",
        prediction.rul,
        prediction.status,
        frame.n_rows(),
        filename
    );

    Ok(PredictResponse {
        rul: prediction.rul,
        status: prediction.status,
        color: prediction.status.color(),
        cycles_analyzed: prediction.cycles_analyzed,
        rows_received: frame.n_rows(),
        last_cycle: frame.last_cycle(),
    })
}

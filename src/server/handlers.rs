//! Request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::error::{Result, ServerError};
use super::state::{AppState, GatewayState};

/// `input_data` value stored with every gateway prediction
pub const GATEWAY_INPUT_LABEL: &str = "First row of test.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityResponse {
    pub prediction: String,
    pub probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub message: String,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn loaded_predictor(state: &AppState) -> Result<crate::model::Predictor> {
    state
        .predictor
        .clone()
        .map_err(|reason| ServerError::Prediction(format!("model is not loaded: {}", reason)))
}

pub async fn predict(State(state): State<Arc<AppState>>) -> Result<Json<PredictionResponse>> {
    let predictor = loaded_predictor(&state)?;
    let path = state.test_data_path.clone();

    let label = tokio::task::spawn_blocking(move || predictor.predict_file(&path)).await??;
    tracing::info!(prediction = %label, "Prediction served");

    Ok(Json(PredictionResponse {
        prediction: label.to_string(),
    }))
}

pub async fn predict_proba(State(state): State<Arc<AppState>>) -> Result<Json<ProbabilityResponse>> {
    let predictor = loaded_predictor(&state)?;
    let path = state.test_data_path.clone();

    let probabilities = tokio::task::spawn_blocking(move || predictor.predict_proba_file(&path)).await??;

    // Highest probability wins; the first class wins ties, matching predict
    let best = probabilities
        .iter()
        .fold(None, |best: Option<&(crate::pipeline::PriceBucket, f64)>, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|(label, _)| label.to_string())
        .ok_or_else(|| ServerError::Prediction("classifier returned no probabilities".to_string()))?;

    Ok(Json(ProbabilityResponse {
        prediction: best,
        probabilities: probabilities
            .into_iter()
            .map(|(label, p)| (label.to_string(), p))
            .collect(),
    }))
}

pub async fn gateway_predict(State(state): State<Arc<GatewayState>>) -> Result<Json<GatewayResponse>> {
    let body: PredictionResponse = state
        .client
        .get(state.predict_url())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let message = format!(
        "The prediction for the first row of test.csv is: {}",
        body.prediction
    );

    state.store.record(GATEWAY_INPUT_LABEL, &body.prediction).await?;
    tracing::info!(prediction = %body.prediction, "Gateway prediction recorded");

    Ok(Json(GatewayResponse { message }))
}

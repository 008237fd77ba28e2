//! Shared state of the two services

use std::path::PathBuf;
use std::sync::Arc;

use crate::model::Predictor;

use super::store::PredictionStore;

/// Model service state: the loaded predictor and the file it reads from
pub struct AppState {
    /// The load error is kept so `/predict` can report it while `/health` stays up
    pub predictor: Result<Predictor, String>,
    pub test_data_path: PathBuf,
}

impl AppState {
    pub fn new(predictor: Predictor, test_data_path: PathBuf) -> Self {
        Self {
            predictor: Ok(predictor),
            test_data_path,
        }
    }

    pub fn unavailable(reason: String, test_data_path: PathBuf) -> Self {
        Self {
            predictor: Err(reason),
            test_data_path,
        }
    }
}

/// Gateway state: HTTP client to the model service and the prediction log
pub struct GatewayState {
    pub client: reqwest::Client,
    pub model_url: String,
    pub store: Arc<dyn PredictionStore>,
}

impl GatewayState {
    pub fn new(model_url: impl Into<String>, store: Arc<dyn PredictionStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model_url: model_url.into(),
            store,
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.model_url.trim_end_matches('/'))
    }
}

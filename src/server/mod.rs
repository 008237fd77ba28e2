//! HTTP services
//!
//! Two deployment variants share this module: the model service answers
//! predictions from a loaded bundle, and the gateway forwards to the model
//! service and records each prediction in PostgreSQL.

mod api;
mod error;
mod handlers;
mod state;
pub mod store;

pub use api::{create_gateway_router, create_router};
pub use error::ServerError;
pub use handlers::{GatewayResponse, PredictionResponse, ProbabilityResponse, GATEWAY_INPUT_LABEL};
pub use state::{AppState, GatewayState};
pub use store::{DbConfig, PostgresStore, PredictionStore};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::model::{Predictor, DEFAULT_MODEL_PATH};

/// Port of the model service when `API_PORT` is unset
pub const DEFAULT_MODEL_PORT: u16 = 5001;
/// Port of the gateway when `API_PORT` is unset
pub const DEFAULT_GATEWAY_PORT: u16 = 8000;
pub const DEFAULT_MODEL_URL: &str = "http://model:5001";
pub const DEFAULT_TEST_DATA_PATH: &str = "test.csv";

fn env_host() -> String {
    std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}

fn env_port(default: u16) -> u16 {
    std::env::var("API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}

/// Model service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// File whose first row `/predict` classifies
    pub test_data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_host(),
            port: env_port(DEFAULT_MODEL_PORT),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
                .into(),
            test_data_path: std::env::var("TEST_DATA_PATH")
                .unwrap_or_else(|_| DEFAULT_TEST_DATA_PATH.to_string())
                .into(),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub model_url: String,
    pub db: DbConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: env_host(),
            port: env_port(DEFAULT_GATEWAY_PORT),
            model_url: std::env::var("MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_URL.to_string()),
            db: DbConfig::default(),
        }
    }
}

/// Start the model service.
///
/// The bundle is loaded once here. If it cannot be loaded the service still
/// starts so `/health` answers, and `/predict` reports the load error.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = match Predictor::load(&config.model_path) {
        Ok(predictor) => {
            info!(
                model_path = %config.model_path.display(),
                features = predictor.bundle().schema.columns.len(),
                components = predictor.bundle().reducer.n_components(),
                "Model bundle loaded"
            );
            AppState::new(predictor, config.test_data_path.clone())
        }
        Err(e) => {
            error!(model_path = %config.model_path.display(), error = %format!("{:#}", e), "Failed to load model bundle");
            AppState::unavailable(format!("{:#}", e), config.test_data_path.clone())
        }
    };

    if !config.test_data_path.exists() {
        warn!(test_data_path = %config.test_data_path.display(), "Test data file not found, /predict will fail");
    }

    let app = create_router(Arc::new(state));
    serve(app, &config.host, config.port, "Model service").await
}

/// Start the gateway
pub async fn run_gateway(config: GatewayConfig) -> anyhow::Result<()> {
    info!(
        model_url = %config.model_url,
        db_host = %config.db.host,
        db_name = %config.db.dbname,
        "Gateway configured"
    );

    let store = Arc::new(PostgresStore::new(config.db.clone()));
    let state = Arc::new(GatewayState::new(config.model_url.clone(), store));
    let app = create_gateway_router(state);
    serve(app, &config.host, config.port, "Gateway").await
}

async fn serve(app: axum::Router, host: &str, port: u16, name: &str) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        service = name,
        address = %addr,
        pid = std::process::id(),
        started_at = %start_time.to_rfc3339(),
        "Listening (press ctrl+c to stop)"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c, shutting down");
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!(service = name, "Shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        if std::env::var("API_PORT").is_err() {
            assert_eq!(ServerConfig::default().port, DEFAULT_MODEL_PORT);
            assert_eq!(GatewayConfig::default().port, DEFAULT_GATEWAY_PORT);
        }
    }

    #[test]
    fn test_db_defaults() {
        if std::env::var("DB_HOST").is_err() && std::env::var("DB_USER").is_err() {
            let db = DbConfig::default();
            assert_eq!(db.host, "db");
            assert_eq!(db.user, "admin");
        }
    }
}

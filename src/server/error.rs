//! Error types for the HTTP services

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Model service request failed: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an error together with every `source()` below it
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::Upstream(error_chain(&err))
    }
}

impl From<tokio_postgres::Error> for ServerError {
    fn from(err: tokio_postgres::Error) -> Self {
        ServerError::Database(error_chain(&err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Prediction(format!("{:#}", err))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Prediction(format!("prediction task did not complete: {}", err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        match &self {
            ServerError::Upstream(_) => tracing::error!(detail = %detail, "Model service error"),
            ServerError::Database(_) => tracing::error!(detail = %detail, "Database error"),
            ServerError::Prediction(_) => tracing::error!(detail = %detail, "Prediction error"),
            ServerError::Io(_) => tracing::error!(detail = %detail, "IO error"),
        }

        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_context_is_kept() {
        let err = anyhow::anyhow!("column missing").context("Failed to read first row of test.csv");
        let server: ServerError = err.into();
        let text = server.to_string();
        assert!(text.contains("Failed to read first row of test.csv"));
        assert!(text.contains("column missing"));
    }

    #[test]
    fn test_every_variant_has_detail() {
        let errors = [
            ServerError::Upstream("connection refused".into()),
            ServerError::Database("timed out".into()),
            ServerError::Prediction("bad shape".into()),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}

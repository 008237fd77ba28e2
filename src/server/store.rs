//! Prediction log kept by the gateway

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;

use super::error::Result;

/// Connection parameters for the predictions database
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "db".to_string()),
            dbname: std::env::var("DB_NAME").unwrap_or_else(|_| "predictions".to_string()),
            user: std::env::var("DB_USER").unwrap_or_else(|_| "admin".to_string()),
            password: std::env::var("DB_PASSWORD").unwrap_or_else(|_| "password".to_string()),
        }
    }
}

/// Somewhere to record `(input_data, prediction)` pairs
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn record(&self, input_data: &str, prediction: &str) -> Result<()>;
}

/// Writes into the `predictions` table, one connection per call
#[derive(Debug, Clone)]
pub struct PostgresStore {
    config: DbConfig,
}

impl PostgresStore {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PredictionStore for PostgresStore {
    async fn record(&self, input_data: &str, prediction: &str) -> Result<()> {
        let (client, connection) = tokio_postgres::Config::new()
            .host(&self.config.host)
            .dbname(&self.config.dbname)
            .user(&self.config.user)
            .password(&self.config.password)
            .connect(NoTls)
            .await?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Database connection closed with error");
            }
        });

        client
            .execute(
                "INSERT INTO predictions (input_data, prediction) VALUES ($1, $2)",
                &[&input_data, &prediction],
            )
            .await?;

        // Dropping the client closes the connection; wait for the driver to finish
        drop(client);
        join_driver(driver).await;

        tracing::debug!(prediction, "Prediction recorded");
        Ok(())
    }
}

/// Wait for a connection driver task, logging it if the task panicked or was
/// cancelled. Returns whether the task ran to completion.
async fn join_driver(driver: JoinHandle<()>) -> bool {
    match driver.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database connection task failed");
            false
        }
    }
}

//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// House price classification: clean, train, evaluate and serve
#[derive(Parser, Debug)]
#[command(name = "houseprice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean the raw training data: drop sparse columns and impute the rest
    Preprocess(PreprocessArgs),

    /// Train the classifier and write the model bundle
    Train(TrainArgs),

    /// Evaluate a trained bundle and write the metrics report and heatmap
    Evaluate(EvaluateArgs),

    /// Predict the price bucket of the first row of a file
    Predict(PredictArgs),

    /// Run the model service (GET /health, /predict, /predict/proba)
    Serve(ServeArgs),

    /// Run the gateway that forwards to the model service and records predictions
    Gateway(GatewayArgs),

    /// Write the pipeline descriptor for an external container runner
    Pipeline(PipelineArgs),
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Raw training data (CSV or Parquet)
    #[arg(short, long, default_value = "train.csv")]
    pub input: PathBuf,

    /// Raw test data; its columns are checked against the cleaned training data
    #[arg(long, default_value = "test.csv")]
    pub test: PathBuf,

    /// Where the cleaned data is written (CSV or Parquet, by extension)
    #[arg(short, long, alias = "data_path", default_value = "cleaned_data.csv")]
    pub output: PathBuf,

    /// Target column name (never dropped)
    #[arg(short, long, default_value = "SalePrice")]
    pub target: String,

    /// Drop columns whose missing ratio is strictly above this value
    #[arg(long, default_value = "0.5", value_parser = validate_fraction)]
    pub missing_threshold: f64,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for a full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Cleaned training data
    #[arg(short, long, alias = "data_path", default_value = "cleaned_data.csv")]
    pub data: PathBuf,

    /// Where the model bundle is written
    #[arg(short, long, alias = "model_path", default_value = "mlp_classifier_model.json")]
    pub model: PathBuf,

    /// Target column name
    #[arg(short, long, default_value = "SalePrice")]
    pub target: String,

    /// Fraction of rows held out for testing
    #[arg(long, default_value = "0.2", value_parser = validate_open_fraction)]
    pub test_size: f64,

    /// Seed for the split, oversampling and weight initialization
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Share of variance kept by PCA
    #[arg(long, default_value = "0.95", value_parser = validate_open_fraction)]
    pub variance: f64,

    /// Hidden layer sizes (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "100,50")]
    pub hidden_layers: Vec<usize>,

    /// Maximum number of training epochs
    #[arg(long, default_value = "500")]
    pub max_iter: usize,

    /// Adam learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: f64,

    /// Fallback for a column absent at inference time, as COLUMN=VALUE.
    /// Repeatable; FireplaceQu=TA is always included.
    #[arg(long = "column-default", value_name = "COLUMN=VALUE")]
    pub column_defaults: Vec<String>,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Model bundle to evaluate
    #[arg(short, long, alias = "model_path", default_value = "mlp_classifier_model.json")]
    pub model: PathBuf,

    /// Labeled data (the cleaned training data by default)
    #[arg(short, long, alias = "data_path", default_value = "cleaned_data.csv")]
    pub data: PathBuf,

    /// Metrics report path
    #[arg(long, alias = "metrics_path", default_value = "model_metrics.txt")]
    pub metrics: PathBuf,

    /// Confusion matrix heatmap path (PNG)
    #[arg(long, default_value = "confusion_matrix.png")]
    pub heatmap: PathBuf,

    /// Evaluate every row instead of the held-out split stored in the bundle
    #[arg(long, default_value = "false")]
    pub all_rows: bool,

    /// Also export the metrics with run metadata as JSON
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Model bundle
    #[arg(short, long, alias = "model_path", default_value = "mlp_classifier_model.json")]
    pub model: PathBuf,

    /// File whose first row is classified
    #[arg(short, long, default_value = "test.csv")]
    pub input: PathBuf,

    /// Also print the probability of each bucket
    #[arg(long, default_value = "false")]
    pub proba: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (defaults to API_HOST or 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (defaults to API_PORT or 5001)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Model bundle (defaults to MODEL_PATH or mlp_classifier_model.json)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// File read by /predict (defaults to TEST_DATA_PATH or test.csv)
    #[arg(long)]
    pub test_data: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Bind address (defaults to API_HOST or 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (defaults to API_PORT or 8000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the model service (defaults to MODEL_URL or http://model:5001)
    #[arg(long)]
    pub model_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Where the descriptor is written
    #[arg(short, long, default_value = "pipeline.json")]
    pub output: PathBuf,

    /// Container image every stage runs
    #[arg(long, default_value = "houseprice:latest")]
    pub image: String,

    #[arg(long, alias = "data_path", default_value = "/app/data/cleaned_data.csv")]
    pub data_path: String,

    #[arg(long, alias = "model_path", default_value = "/app/models/mlp_classifier_model.json")]
    pub model_path: String,

    #[arg(long, alias = "metrics_path", default_value = "/app/metrics/model_metrics.txt")]
    pub metrics_path: String,
}

/// Validator for ratios in [0, 1]
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for ratios strictly between 0 and 1
fn validate_open_fraction(s: &str) -> Result<f64, String> {
    let value = validate_fraction(s)?;
    if value == 0.0 || value == 1.0 {
        Err(format!("value must be strictly between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

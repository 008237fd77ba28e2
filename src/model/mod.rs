//! Model module - classifier, training run, evaluation, persisted bundle and predictor

pub mod bundle;
pub mod evaluate;
pub mod mlp;
pub mod predictor;
pub mod train;

pub use bundle::*;
pub use evaluate::{evaluate_bundle, Evaluation, EvaluationRows};
pub use mlp::{FitSummary, MlpClassifier, MlpConfig};
pub use predictor::Predictor;
pub use train::{select_rows, train_bundle, TrainOptions, TrainReport};

//! houseprice: house price classification
//!
//! Cleans tabular housing data, reduces it with scaling, one-hot encoding
//! and PCA, trains a multilayer perceptron on three price buckets, evaluates
//! it, and serves predictions over HTTP.

pub mod cli;
pub mod model;
pub mod orchestration;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod utils;

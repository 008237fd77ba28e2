//! Report module - evaluation metrics, confusion heatmap and stage summaries

pub mod heatmap;
pub mod metrics;
pub mod summary;

pub use heatmap::*;
pub use metrics::*;
pub use summary::*;

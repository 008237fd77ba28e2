//! CLI module - argument parsing and one runner per stage

mod args;
pub mod evaluate;
pub mod pipeline;
pub mod predict;
pub mod preprocess;
pub mod train;

pub use args::*;

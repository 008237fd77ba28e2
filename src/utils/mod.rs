//! Console helpers shared by the offline stages

pub mod progress;
pub mod styling;

pub use progress::*;
pub use styling::*;

//! Pipeline module - the offline data preparation steps

pub mod balance;
pub mod loader;
pub mod missing;
pub mod reducer;
pub mod schema;
pub mod split;
pub mod target;

pub use balance::*;
pub use loader::*;
pub use missing::*;
pub use reducer::{FeatureReducer, OneHotEncoder, Pca, StandardScaler, DEFAULT_VARIANCE};
pub use schema::*;
pub use split::*;
pub use target::*;

pub mod config;
pub mod feature_ingest;

pub use config::*;
pub use feature_ingest::*;

pub mod config;
pub mod partition;

pub use config::*;
pub use partition::*;

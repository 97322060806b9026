use formats::FeatureError;
use layers::RouteError;

use crate::context::RouteOutcome;

/// Why a remote import produced no features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Network(String),
    Decode(String),
    Interrupted,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Network(msg) => write!(f, "import request failed: {msg}"),
            ImportError::Decode(msg) => write!(f, "import payload unreadable: {msg}"),
            ImportError::Interrupted => write!(f, "import interrupted"),
        }
    }
}

impl std::error::Error for ImportError {}

/// Result of merging a completed import into the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub accepted: usize,
    pub duplicates: Vec<String>,
    pub rejected: Vec<FeatureError>,
    /// Routing that followed the merge. The merge stands even if this failed.
    pub route: Result<RouteOutcome, RouteError>,
}

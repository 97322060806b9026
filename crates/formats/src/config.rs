use density::ClusterConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Json(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "config json: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reads a `ClusterConfig` from JSON. Missing fields take their defaults.
pub fn load_config(json: &str) -> Result<ClusterConfig, ConfigError> {
    let config: ClusterConfig =
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, load_config};
    use density::ClusterConfig;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(load_config("{}").unwrap(), ClusterConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load_config(
            r#"{"min_cluster": 5, "radius": {"steps": [{"max_zoom": 9, "radius_px": 90.0}], "fallback_px": 30.0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.min_cluster, 5);
        assert_eq!(cfg.radius.radius(9), 90.0);
        assert_eq!(cfg.radius.radius(10), 30.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load_config(r#"{"min_cluster": 1}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(load_config("[1, 2"), Err(ConfigError::Json(_))));
    }
}

use serde::{Deserialize, Serialize};

/// Radius used for every zoom up to and including `max_zoom`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusStep {
    pub max_zoom: u8,
    pub radius_px: f64,
}

/// Piecewise-constant `maxClusterRadius(zoom)`.
///
/// The partitioner and the cluster adapter must both read the radius from the
/// same schedule, otherwise the cell-size guarantee no longer holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusSchedule {
    /// Sorted by ascending `max_zoom`.
    pub steps: Vec<RadiusStep>,
    /// Radius above the last step.
    pub fallback_px: f64,
}

impl Default for RadiusSchedule {
    fn default() -> Self {
        Self {
            steps: vec![
                RadiusStep {
                    max_zoom: 12,
                    radius_px: 70.0,
                },
                RadiusStep {
                    max_zoom: 13,
                    radius_px: 55.0,
                },
            ],
            fallback_px: 40.0,
        }
    }
}

impl RadiusSchedule {
    pub fn constant(radius_px: f64) -> Self {
        Self {
            steps: Vec::new(),
            fallback_px: radius_px,
        }
    }

    pub fn radius(&self, zoom: u8) -> f64 {
        self.steps
            .iter()
            .find(|s| zoom <= s.max_zoom)
            .map(|s| s.radius_px)
            .unwrap_or(self.fallback_px)
    }

    /// Side of a grid cell whose diagonal equals `radius(zoom)`.
    pub fn cell_size(&self, zoom: u8) -> f64 {
        self.radius(zoom) / std::f64::consts::SQRT_2
    }

    fn validate(&self) -> Result<(), String> {
        let valid = |r: f64| r.is_finite() && r > 0.0;
        if !valid(self.fallback_px) {
            return Err(format!("fallback radius must be > 0, got {}", self.fallback_px));
        }
        for s in &self.steps {
            if !valid(s.radius_px) {
                return Err(format!(
                    "radius for zoom <= {} must be > 0, got {}",
                    s.max_zoom, s.radius_px
                ));
            }
        }
        if self.steps.windows(2).any(|w| w[0].max_zoom >= w[1].max_zoom) {
            return Err("radius steps must be sorted by strictly ascending max_zoom".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Smallest cell population routed to the cluster layer.
    pub min_cluster: usize,
    pub radius: RadiusSchedule,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_cluster: 10,
            radius: RadiusSchedule::default(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_cluster < 2 {
            return Err(format!("min_cluster must be >= 2, got {}", self.min_cluster));
        }
        self.radius.validate()
    }
}

use super::Vec2;

/// Latitude limit of the square web mercator world.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The host widget cannot project yet (no size, no view).
    NotReady,
    ZoomOutOfRange { zoom: u8, min: u8, max: u8 },
    NonFinite,
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::NotReady => write!(f, "projection not ready"),
            ProjectionError::ZoomOutOfRange { zoom, min, max } => {
                write!(f, "zoom {zoom} outside projector range {min}..={max}")
            }
            ProjectionError::NonFinite => write!(f, "projection produced a non-finite position"),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Converts a geocoordinate into a pixel position at an integer zoom.
///
/// Implemented by the host map widget; `WebMercator` is the stock implementation.
pub trait Projector {
    /// Inclusive `(min, max)` zoom range the projector accepts.
    fn zoom_range(&self) -> (u8, u8);

    fn project(&self, coord: LatLng, zoom: u8) -> Result<Vec2, ProjectionError>;

    fn check_zoom(&self, zoom: u8) -> Result<(), ProjectionError> {
        let (min, max) = self.zoom_range();
        if zoom < min || zoom > max {
            return Err(ProjectionError::ZoomOutOfRange { zoom, min, max });
        }
        Ok(())
    }
}

/// Spherical web mercator onto a `tile_size * 2^zoom` square of world pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WebMercator {
    pub tile_size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            tile_size: 256.0,
            min_zoom: 0,
            max_zoom: 22,
        }
    }
}

impl WebMercator {
    pub fn world_size(&self, zoom: u8) -> f64 {
        self.tile_size * f64::from(zoom).exp2()
    }
}

impl Projector for WebMercator {
    fn zoom_range(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    fn project(&self, coord: LatLng, zoom: u8) -> Result<Vec2, ProjectionError> {
        self.check_zoom(zoom)?;
        let size = self.world_size(zoom);
        let lat = coord
            .lat
            .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
            .to_radians();

        let x = (coord.lng + 180.0) / 360.0 * size;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) * 0.5 * size;

        let p = Vec2::new(x, y);
        if !p.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, ProjectionError, Projector, WebMercator};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let proj = WebMercator::default();
        let p = proj.project(LatLng::new(0.0, 0.0), 0).unwrap();
        assert_close(p.x, 128.0, 1e-9);
        assert_close(p.y, 128.0, 1e-9);
    }

    #[test]
    fn each_zoom_doubles_pixel_distance() {
        let proj = WebMercator::default();
        let a = LatLng::new(47.0, 8.0);
        let b = LatLng::new(47.01, 8.01);
        let d10 = proj.project(a, 10).unwrap().distance(proj.project(b, 10).unwrap());
        let d11 = proj.project(a, 11).unwrap().distance(proj.project(b, 11).unwrap());
        assert_close(d11, d10 * 2.0, 1e-6);
    }

    #[test]
    fn poles_are_clamped() {
        let proj = WebMercator::default();
        let p = proj.project(LatLng::new(90.0, 0.0), 1).unwrap();
        assert_close(p.y, 0.0, 1e-6);
    }

    #[test]
    fn rejects_zoom_outside_range() {
        let proj = WebMercator {
            max_zoom: 18,
            ..WebMercator::default()
        };
        let err = proj.project(LatLng::new(0.0, 0.0), 19).unwrap_err();
        assert_eq!(
            err,
            ProjectionError::ZoomOutOfRange {
                zoom: 19,
                min: 0,
                max: 18
            }
        );
    }

    #[test]
    fn latlng_validity() {
        assert!(LatLng::new(45.0, -120.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, 181.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }
}

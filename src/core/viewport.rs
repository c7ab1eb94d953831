use crate::core::config::ViewConfig;
use crate::core::constants::{MAX_LATITUDE, MAX_LONGITUDE, MAX_TILE_ZOOM};
use crate::core::geo::{lon_lat_to_tile_fractional, LonLat, Point};
use serde::{Deserialize, Serialize};

/// The current view of the map: center and integer zoom.
///
/// Every write clamps silently; out-of-range input is never an error.
/// Setters report whether the stored value actually changed so the owner
/// can skip notifications for no-op writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: LonLat,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    max_latitude: f64,
    max_longitude: f64,
}

impl Viewport {
    /// Creates a viewport from configuration, clamping the initial values.
    ///
    /// Bounds that `ViewConfig` validation would reject are normalised
    /// rather than trusted: zoom limits are ordered and capped to the tile
    /// grid, and out-of-range latitude or longitude limits fall back to the
    /// defaults.
    pub fn new(config: &ViewConfig) -> Self {
        let max_zoom = config.max_zoom.min(MAX_TILE_ZOOM);
        let min_zoom = config.min_zoom.min(max_zoom);
        let max_latitude = if (0.0..90.0).contains(&config.max_latitude) {
            config.max_latitude
        } else {
            log::warn!("ignoring max_latitude {}", config.max_latitude);
            MAX_LATITUDE
        };
        let max_longitude = if config.max_longitude > 0.0 && config.max_longitude <= 180.0 {
            config.max_longitude
        } else {
            log::warn!("ignoring max_longitude {}", config.max_longitude);
            MAX_LONGITUDE
        };

        let mut viewport = Self {
            center: LonLat::default(),
            zoom: min_zoom,
            min_zoom,
            max_zoom,
            max_latitude,
            max_longitude,
        };
        viewport.set_center(config.center_lon, config.center_lat);
        viewport.set_zoom(config.zoom as i32);
        viewport
    }

    pub fn center(&self) -> LonLat {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn zoom_limits(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    /// Sets the center, clamping longitude and latitude to their bounds.
    /// Non-finite input is ignored and reported as no change.
    pub fn set_center(&mut self, lon: f64, lat: f64) -> bool {
        if !lon.is_finite() || !lat.is_finite() {
            log::debug!("ignoring non-finite center {}, {}", lon, lat);
            return false;
        }
        let clamped = LonLat::new(lon, lat).clamped(self.max_longitude, self.max_latitude);
        if clamped == self.center {
            return false;
        }
        self.center = clamped;
        true
    }

    /// Sets the zoom level, clamping to the configured range
    pub fn set_zoom(&mut self, zoom: i32) -> bool {
        let clamped = zoom.clamp(self.min_zoom as i32, self.max_zoom as i32) as u8;
        if clamped == self.zoom {
            return false;
        }
        self.zoom = clamped;
        true
    }

    /// Fractional tile coordinate of the center at the current zoom
    pub fn center_tile(&self) -> Point {
        lon_lat_to_tile_fractional(self.center.lon, self.center.lat, self.zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_defaults() {
        let viewport = Viewport::default();
        assert_eq!(viewport.zoom(), 10);
        assert_eq!(viewport.center(), LonLat::new(6.839349, 47.64263));
    }

    #[test]
    fn test_center_clamping() {
        let mut viewport = Viewport::default();
        assert!(viewport.set_center(200.0, 100.0));
        assert_eq!(viewport.center(), LonLat::new(180.0, 85.0));

        assert!(viewport.set_center(-500.0, -90.0));
        assert_eq!(viewport.center(), LonLat::new(-180.0, -85.0));
    }

    #[test]
    fn test_repeated_center_is_idempotent() {
        let mut viewport = Viewport::default();
        assert!(viewport.set_center(12.5, 41.9));
        let stored = viewport.center();
        assert!(!viewport.set_center(12.5, 41.9));
        assert_eq!(viewport.center(), stored);
    }

    #[test]
    fn test_clamped_write_to_same_bound_is_no_change() {
        let mut viewport = Viewport::default();
        viewport.set_center(200.0, 100.0);
        assert!(!viewport.set_center(300.0, 95.0));
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(3);
        assert_eq!(viewport.zoom(), 5);

        viewport.set_zoom(20);
        assert_eq!(viewport.zoom(), 15);

        assert!(viewport.set_zoom(7));
        assert!(!viewport.set_zoom(7));
    }

    #[test]
    fn test_initial_values_are_clamped() {
        let config = ViewConfig {
            center_lon: 0.0,
            center_lat: 89.0,
            zoom: 2,
            ..ViewConfig::default()
        };
        let viewport = Viewport::new(&config);
        assert_eq!(viewport.center().lat, 85.0);
        assert_eq!(viewport.zoom(), 5);
    }

    #[test]
    fn test_non_finite_center_is_ignored() {
        let mut viewport = Viewport::default();
        let before = viewport.center();
        assert!(!viewport.set_center(f64::NAN, f64::NAN));
        assert!(!viewport.set_center(f64::INFINITY, 10.0));
        assert!(!viewport.set_center(10.0, f64::NEG_INFINITY));
        assert_eq!(viewport.center(), before);

        // Later writes still compare against a real center
        assert!(viewport.set_center(1.0, 2.0));
        assert!(!viewport.set_center(1.0, 2.0));
    }

    #[test]
    fn test_unvalidated_bounds_are_normalised() {
        let config = ViewConfig {
            min_zoom: 12,
            max_zoom: 8,
            max_latitude: f64::NAN,
            max_longitude: -10.0,
            ..ViewConfig::default()
        };
        let mut viewport = Viewport::new(&config);
        assert_eq!(viewport.zoom_limits(), (8, 8));
        assert_eq!(viewport.zoom(), 8);

        viewport.set_center(500.0, 100.0);
        assert_eq!(viewport.center(), LonLat::new(MAX_LONGITUDE, MAX_LATITUDE));
    }

    #[test]
    fn test_zoom_limit_capped_to_tile_grid() {
        let config = ViewConfig {
            max_zoom: 200,
            ..ViewConfig::default()
        };
        let mut viewport = Viewport::new(&config);
        viewport.set_zoom(100);
        assert_eq!(viewport.zoom(), MAX_TILE_ZOOM);
    }
}

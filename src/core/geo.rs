//! Web-Mercator (slippy-map) coordinate math.
//!
//! Everything here is a pure function of its arguments. Tile coordinates
//! grow eastwards in `x` and southwards in `y`; at zoom `z` the world is
//! `2^z × 2^z` tiles of [`TILE_SIZE`] pixels.

use crate::core::constants::TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A geographical coordinate, longitude first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    /// Creates a new coordinate
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Clamps both components into the given symmetric bounds
    pub fn clamped(&self, max_lon: f64, max_lat: f64) -> Self {
        Self::new(
            self.lon.clamp(-max_lon, max_lon),
            self.lat.clamp(-max_lat, max_lat),
        )
    }
}

impl Default for LonLat {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen, buffer, or tile space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Widget size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both dimensions by an integer factor
    pub fn scaled(&self, factor: u32) -> PixelSize {
        PixelSize::new(self.width * factor, self.height * factor)
    }
}

/// Identifies one raster tile in the slippy-map pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this key's zoom level
    pub fn axis_len(&self) -> u32 {
        1_u32 << self.zoom
    }

    /// Checks if the tile lies inside the grid of its zoom level
    pub fn is_valid(&self) -> bool {
        self.x < self.axis_len() && self.y < self.axis_len()
    }

    /// Northwest corner of the tile
    pub fn north_west(&self) -> LonLat {
        tile_to_lon_lat(self.x as f64, self.y as f64, self.zoom)
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

fn tiles_per_axis(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32)
}

/// Converts a coordinate to fractional tile coordinates at `zoom`.
///
/// Only `lat = ±90` is singular; callers clamp latitude beforehand.
pub fn lon_lat_to_tile_fractional(lon: f64, lat: f64, zoom: u8) -> Point {
    let n = tiles_per_axis(zoom);
    let lat_rad = lat.to_radians();
    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    Point::new(x, y)
}

/// Integer tile containing the coordinate
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> (i64, i64) {
    let fractional = lon_lat_to_tile_fractional(lon, lat, zoom).floor();
    (fractional.x as i64, fractional.y as i64)
}

/// Inverse of [`lon_lat_to_tile_fractional`]. Integer arguments give the
/// northwest corner of a tile; fractional ones any point inside it.
pub fn tile_to_lon_lat(x: f64, y: f64, zoom: u8) -> LonLat {
    let n = tiles_per_axis(zoom);
    let lon = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    LonLat::new(lon, lat)
}

/// Converts a screen-space pixel delta into a longitude/latitude delta.
///
/// Linear approximation around `center_lat`: screen `y` grows downwards
/// while latitude grows upwards, and Mercator stretches vertical distances
/// by `sec(lat)`. Accurate for drag-sized deltas only.
pub fn pixel_delta_to_lon_lat_delta(dx: f64, dy: f64, center_lat: f64, zoom: u8) -> (f64, f64) {
    let world_size = TILE_SIZE as f64 * tiles_per_axis(zoom);
    let d_lon = 360.0 * dx / world_size;
    let sec_lat = 1.0 / center_lat.to_radians().cos();
    let d_lat = -360.0 * dy / (world_size * sec_lat);
    (d_lon, d_lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_grid_center() {
        let p = lon_lat_to_tile_fractional(0.0, 0.0, 10);
        assert!((p.x - 512.0).abs() < 1e-9);
        assert!((p.y - 512.0).abs() < 1e-9);
    }

    #[test]
    fn test_tile_round_trip_all_zooms() {
        for zoom in 5..=15u8 {
            let n = 1_u32 << zoom;
            let samples = [0, 1, n / 3, n / 2, n - 2, n - 1];
            for &x in &samples {
                for &y in &samples {
                    let center = tile_to_lon_lat(x as f64 + 0.5, y as f64 + 0.5, zoom);
                    let (tx, ty) = lon_lat_to_tile(center.lon, center.lat, zoom);
                    assert_eq!((tx, ty), (x as i64, y as i64), "zoom {}", zoom);
                }
            }
        }
    }

    #[test]
    fn test_corner_inverse_is_close() {
        let corner = tile_to_lon_lat(531.0, 360.0, 10);
        let back = lon_lat_to_tile_fractional(corner.lon, corner.lat, 10);
        assert!((back.x - 531.0).abs() < 1e-6);
        assert!((back.y - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_belfort_tile() {
        let (x, y) = lon_lat_to_tile(6.839349, 47.64263, 10);
        assert_eq!((x, y), (531, 357));
    }

    #[test]
    fn test_pixel_delta_longitude_is_linear() {
        let (d_lon, d_lat) = pixel_delta_to_lon_lat_delta(256.0, 0.0, 0.0, 10);
        assert!((d_lon - 0.3515625).abs() < 1e-12);
        assert_eq!(d_lat, 0.0);
    }

    #[test]
    fn test_pixel_delta_latitude_inverts_and_scales() {
        let (_, at_equator) = pixel_delta_to_lon_lat_delta(0.0, 100.0, 0.0, 10);
        let (_, at_sixty) = pixel_delta_to_lon_lat_delta(0.0, 100.0, 60.0, 10);
        assert!(at_equator < 0.0);
        // sec(60°) = 2, so the same pixel delta covers half the latitude
        assert!((at_sixty - at_equator / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tile_key_validity() {
        assert!(TileKey::new(5, 31, 31).is_valid());
        assert!(!TileKey::new(5, 32, 0).is_valid());
        assert_eq!(TileKey::new(7, 3, 9).to_string(), "7/3/9");
    }
}

//! Configuration for the tile engine
//!
//! Every section has defaults matching the desktop viewer the engine was
//! extracted from, so `EngineConfig::default()` is a working setup. The
//! whole tree is serde-(de)serializable and can be loaded from JSON.

use crate::core::constants::{
    BACKGROUND_RGBA, CACHE_DIR_NAME, DEFAULT_CENTER, DEFAULT_USER_AGENT, DEFAULT_ZOOM,
    MAX_LATITUDE, MAX_LONGITUDE, MAX_TILE_ZOOM, MAX_ZOOM, MIN_TILES_PER_AXIS, MIN_ZOOM, OSM_TILE_TEMPLATE,
    OVERSIZE_FACTOR, TILE_MARGIN,
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub view: ViewConfig,
    pub tiles: TileServerConfig,
    pub cache: CacheConfig,
    pub loader: TileLoaderConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Rejects settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.view.min_zoom > self.view.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.view.min_zoom, self.view.max_zoom
            )));
        }
        if self.view.max_zoom > MAX_TILE_ZOOM {
            return Err(MapError::Config(format!(
                "max_zoom {} is outside the tile grid",
                self.view.max_zoom
            )));
        }
        if !(0.0..90.0).contains(&self.view.max_latitude) {
            return Err(MapError::Config(format!(
                "max_latitude {} must lie in [0, 90)",
                self.view.max_latitude
            )));
        }
        if !(self.view.max_longitude > 0.0 && self.view.max_longitude <= 180.0) {
            return Err(MapError::Config(format!(
                "max_longitude {} must lie in (0, 180]",
                self.view.max_longitude
            )));
        }
        if self.render.oversize_factor == 0 {
            return Err(MapError::Config("oversize_factor must be at least 1".into()));
        }
        if self.loader.max_concurrent == 0 {
            return Err(MapError::Config("max_concurrent must be at least 1".into()));
        }
        if self.tiles.user_agent.trim().is_empty() {
            return Err(MapError::Config(
                "a user agent is required, tile servers reject anonymous clients".into(),
            ));
        }
        Ok(())
    }
}

/// Bounds and initial state of the viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lon: DEFAULT_CENTER.0,
            center_lat: DEFAULT_CENTER.1,
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            max_latitude: MAX_LATITUDE,
            max_longitude: MAX_LONGITUDE,
        }
    }
}

/// Where tiles come from and how the client identifies itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileServerConfig {
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub user_agent: String,
}

impl Default for TileServerConfig {
    fn default() -> Self {
        Self {
            url_template: OSM_TILE_TEMPLATE.to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// On-disk tile cache settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; the platform cache directory when unset
    pub directory: Option<PathBuf>,
    /// Evict least recently used tiles beyond this count; unbounded when unset
    pub max_tiles: Option<usize>,
}

impl CacheConfig {
    /// Resolves the directory tiles are stored in
    pub fn resolve_directory(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|base| base.join(CACHE_DIR_NAME))
            .ok_or_else(|| MapError::Config("no platform cache directory available".into()))
    }
}

/// Configuration for the tile fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoaderConfig {
    /// Maximum concurrent tile downloads
    pub max_concurrent: usize,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            request_timeout_ms: 10_000,
        }
    }
}

/// Configuration presets for TileLoaderConfig
impl TileLoaderConfig {
    pub fn low_resource() -> Self {
        Self {
            max_concurrent: 4,
            request_timeout_ms: 20_000,
        }
    }

    pub fn high_performance() -> Self {
        Self {
            max_concurrent: 64,
            request_timeout_ms: 5_000,
        }
    }

    pub fn for_testing() -> Self {
        Self {
            max_concurrent: 4,
            request_timeout_ms: 500,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Render buffer geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// The buffer is this many times the widget width and height
    pub oversize_factor: u32,
    pub min_tiles_per_axis: u32,
    pub tile_margin: u32,
    pub background: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            oversize_factor: OVERSIZE_FACTOR,
            min_tiles_per_axis: MIN_TILES_PER_AXIS,
            tile_margin: TILE_MARGIN,
            background: BACKGROUND_RGBA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.view.zoom, 10);
        assert_eq!(config.render.oversize_factor, 4);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "view": { "zoom": 7 }, "cache": { "max_tiles": 500 } }"#,
        )
        .unwrap();
        assert_eq!(config.view.zoom, 7);
        assert_eq!(config.view.min_zoom, 5);
        assert_eq!(config.cache.max_tiles, Some(500));
        assert_eq!(config.tiles, TileServerConfig::default());
    }

    #[test]
    fn test_inverted_zoom_bounds_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "view": { "min_zoom": 12, "max_zoom": 8 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_longitude_bound_checked() {
        let result = EngineConfig::from_json_str(r#"{ "view": { "max_longitude": -10.0 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
        let result = EngineConfig::from_json_str(r#"{ "view": { "max_longitude": 0.0 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
        assert!(EngineConfig::from_json_str(r#"{ "view": { "max_longitude": 90.0 } }"#).is_ok());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = EngineConfig::default();
        config.tiles.user_agent = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_cache_directory_wins() {
        let cache = CacheConfig {
            directory: Some(PathBuf::from("/tmp/tiles")),
            max_tiles: None,
        };
        assert_eq!(cache.resolve_directory().unwrap(), PathBuf::from("/tmp/tiles"));
    }
}

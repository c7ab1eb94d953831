pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod viewport;

// Re-export the essential types
pub use config::EngineConfig;
pub use geo::{LonLat, PixelSize, Point, TileKey};
pub use map::Map;
pub use viewport::Viewport;

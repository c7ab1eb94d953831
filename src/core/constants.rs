//! Engine-wide constants derived from the slippy-map conventions and the
//! defaults of the desktop viewer this engine was extracted from.

/// Square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level the viewport accepts.
pub const MIN_ZOOM: u8 = 5;

/// Highest zoom level the viewport accepts.
pub const MAX_ZOOM: u8 = 15;

/// Deepest zoom whose tile indices still fit the grid arithmetic.
pub const MAX_TILE_ZOOM: u8 = 30;

/// Latitude bound applied on every center write. Keeps `tan`/`sec` away
/// from their singularity at the poles.
pub const MAX_LATITUDE: f64 = 85.0;

/// Longitude bound applied on every center write.
pub const MAX_LONGITUDE: f64 = 180.0;

/// The render buffer is this many times wider and taller than the widget.
pub const OVERSIZE_FACTOR: u32 = 4;

/// Minimum number of tiles loaded along each axis.
pub const MIN_TILES_PER_AXIS: u32 = 5;

/// Extra tiles per axis absorbing the fractional offset and edge rounding.
pub const TILE_MARGIN: u32 = 3;

/// Neutral fill behind tiles that have not arrived yet.
pub const BACKGROUND_RGBA: [u8; 4] = [240, 240, 240, 255];

/// Initial map center (Belfort, France) as (longitude, latitude).
pub const DEFAULT_CENTER: (f64, f64) = (6.839349, 47.64263);

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 10;

/// Tile servers reject clients that do not identify themselves.
pub const DEFAULT_USER_AGENT: &str = concat!("tileview/", env!("CARGO_PKG_VERSION"));

/// Default tile URL template.
pub const OSM_TILE_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Directory name below the platform cache directory.
pub const CACHE_DIR_NAME: &str = "tileview/osm_tiles";

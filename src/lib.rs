//! # tileview
//!
//! A slippy-map tile engine that knows nothing about the widget toolkit
//! hosting it.
//!
//! The host owns a [`Map`], forwards pointer and resize events to it, calls
//! [`Map::poll`] from its event loop to pick up finished downloads, and asks
//! [`Map::paint`] for the pixels to put on screen. Tiles are fetched from an
//! OpenStreetMap-style server, cached on disk, and composited into an
//! oversized buffer so that dragging never waits on the network.

pub mod core;
pub mod input;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod search;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::EngineConfig,
    geo::{LonLat, PixelSize, Point, TileKey},
    map::Map,
    viewport::Viewport,
};

pub use input::{
    events::{EventKind, MapEvent, MouseButton, PointerEvent},
    handler::{Action, InteractionHandler},
};

pub use rendering::buffer::RenderBuffer;

pub use search::{NominatimSearch, Place, PlaceResults, PlaceSearch};

pub use tiles::{
    cache::TileCacheStore,
    loader::{HttpDownloader, TileDownloader, TileFetcher},
    set::{TileRange, TileSet, TileStatus},
    source::{TemplateSource, TileSource},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Place search failed: {0}")]
    Search(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = MapError;

//! Prelude module for common tileview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tileview::prelude::*;`

pub use crate::core::{
    config::{CacheConfig, EngineConfig, RenderConfig, TileLoaderConfig, TileServerConfig, ViewConfig},
    geo::{LonLat, PixelSize, Point, TileKey},
    map::Map,
    viewport::Viewport,
};

pub use crate::input::{
    events::{EventKind, MapEvent, MouseButton, PointerEvent},
    handler::{Action, DragState, InteractionHandler},
};

pub use crate::rendering::buffer::RenderBuffer;

pub use crate::runtime::{init_runtime, runtime, spawn, AsyncSpawner};

pub use crate::search::{NominatimSearch, Place, PlaceResults, PlaceSearch};

pub use crate::tiles::{
    cache::TileCacheStore,
    loader::{HttpDownloader, Request, TileDownloader, TileFetcher, TileImage, TileResult},
    set::{TileRange, TileSet, TileStatus},
    source::{TemplateSource, TileSource},
};

pub use crate::{Error as MapError, Result};

pub use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
pub use std::pin::Pin;

use super::loader::{Request, TileFetcher, TileImage, TileResult};
use crate::core::config::RenderConfig;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{PixelSize, Point, TileKey};
use crate::prelude::HashSet;

/// Inclusive rectangle of tile indices at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Tiles needed to fill the oversized render buffer around `center`.
    ///
    /// `center` is the fractional center tile. Each axis spans
    /// `max(min_tiles, extent·F/256 + margin)` tiles centred on the tile
    /// holding the center, clamped to the grid.
    pub fn covering(center: Point, zoom: u8, size: PixelSize, config: &RenderConfig) -> Self {
        let tiles_x = Self::tiles_per_axis(size.width, config);
        let tiles_y = Self::tiles_per_axis(size.height, config);
        let last = (1_i64 << zoom) - 1;

        let (min_x, max_x) = axis_span(center.x, tiles_x, last);
        let (min_y, max_y) = axis_span(center.y, tiles_y, last);
        Self {
            zoom,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Tile count along an axis of `extent` widget pixels
    pub fn tiles_per_axis(extent: u32, config: &RenderConfig) -> i64 {
        let buffer = extent as i64 * config.oversize_factor as i64;
        (buffer / TILE_SIZE as i64 + config.tile_margin as i64).max(config.min_tiles_per_axis as i64)
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: TileKey) -> bool {
        key.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&key.x)
            && (self.min_y..=self.max_y).contains(&key.y)
    }

    /// Keys in row-major order
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| TileKey::new(self.zoom, x, y)))
    }
}

fn axis_span(center: f64, tiles: i64, last: i64) -> (u32, u32) {
    let base = center.floor() as i64;
    let lo = (base - tiles / 2).clamp(0, last);
    let hi = (base + tiles / 2).clamp(0, last);
    (lo as u32, hi as u32)
}

/// Load state of a single tile relative to the current set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Loading,
    Loaded,
    /// Download or decode failed for the current generation; not retried
    Failed,
    /// Outside the current range
    Absent,
}

/// The tiles currently available for compositing.
///
/// Every reload clears the set and starts a new generation. Results are
/// accepted only for the generation they were requested for, so a
/// download that finishes after the view moved on never lands in the
/// wrong set.
#[derive(Debug, Default)]
pub struct TileSet {
    tiles: Vec<(TileKey, TileImage)>,
    generation: u64,
    range: Option<TileRange>,
    failed: HashSet<TileKey>,
}

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn range(&self) -> Option<TileRange> {
        self.range
    }

    /// Clears the set and returns the new generation
    pub fn reset(&mut self) -> u64 {
        self.tiles.clear();
        self.failed.clear();
        self.range = None;
        self.generation += 1;
        self.generation
    }

    /// Clears the set and requests every tile in `range`.
    ///
    /// Cache hits are inserted immediately; everything else arrives later
    /// through [`TileSet::accept`]. Returns the number of tiles inserted.
    pub fn reload(&mut self, range: TileRange, fetcher: &mut TileFetcher) -> usize {
        let generation = self.reset();
        self.range = Some(range);

        let mut ready = 0;
        for key in range.keys() {
            if let Request::Ready(image) = fetcher.request(key, generation) {
                self.insert(key, image);
                ready += 1;
            }
        }
        log::debug!(
            "reloaded {} tiles at zoom {} (generation {}, {} from cache)",
            range.len(),
            range.zoom,
            generation,
            ready
        );
        ready
    }

    /// Adds or replaces a tile
    pub fn insert(&mut self, key: TileKey, image: TileImage) {
        match self.tiles.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = image,
            None => self.tiles.push((key, image)),
        }
    }

    /// Applies a fetch result; returns true when a tile was added
    pub fn accept(&mut self, result: TileResult) -> bool {
        if result.generation() != self.generation {
            log::trace!(
                "discarding tile {} from generation {} (current {})",
                result.key(),
                result.generation(),
                self.generation
            );
            return false;
        }

        match result {
            TileResult::Loaded { key, image, .. } => {
                self.insert(key, image);
                true
            }
            TileResult::Undecodable { key, .. } | TileResult::Failed { key, .. } => {
                self.failed.insert(key);
                false
            }
        }
    }

    pub fn get(&self, key: TileKey) -> Option<&TileImage> {
        self.tiles
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, image)| image)
    }

    pub fn status(&self, key: TileKey) -> TileStatus {
        if self.get(key).is_some() {
            TileStatus::Loaded
        } else if self.failed.contains(&key) {
            TileStatus::Failed
        } else if self.range.map_or(false, |range| range.contains(key)) {
            TileStatus::Loading
        } else {
            TileStatus::Absent
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(TileKey, TileImage)> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Arc;
    use image::RgbaImage;

    fn tile() -> TileImage {
        Arc::new(RgbaImage::new(256, 256))
    }

    #[test]
    fn test_tiles_per_axis() {
        let config = RenderConfig::default();
        // 800·4/256 = 12, plus margin 3
        assert_eq!(TileRange::tiles_per_axis(800, &config), 15);
        // Tiny widgets still load the minimum
        assert_eq!(TileRange::tiles_per_axis(10, &config), 5);
        assert_eq!(TileRange::tiles_per_axis(0, &config), 5);
    }

    #[test]
    fn test_range_is_centred_on_center_tile() {
        let config = RenderConfig::default();
        let range = TileRange::covering(Point::new(531.45, 357.47), 10, PixelSize::new(800, 600), &config);
        // 15 tiles wide: 531 ± 7; 600·4/256 = 9 + 3 = 12 tall: 357 ± 6
        assert_eq!((range.min_x, range.max_x), (524, 538));
        assert_eq!((range.min_y, range.max_y), (351, 363));
        assert!(range.contains(TileKey::new(10, 531, 357)));
        assert!(!range.contains(TileKey::new(11, 531, 357)));
    }

    #[test]
    fn test_range_clamped_to_grid() {
        let config = RenderConfig::default();
        let range = TileRange::covering(Point::new(0.2, 31.9), 5, PixelSize::new(512, 512), &config);
        assert_eq!(range.min_x, 0);
        assert_eq!(range.max_y, 31);
        assert!(range.keys().all(|key| key.is_valid()));
        assert_eq!(range.keys().count(), range.len());
    }

    #[test]
    fn test_reset_bumps_generation_and_clears() {
        let mut set = TileSet::new();
        set.insert(TileKey::new(5, 1, 1), tile());
        let before = set.generation();
        let after = set.reset();
        assert_eq!(after, before + 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let mut set = TileSet::new();
        let stale = set.reset();
        let current = set.reset();
        let key = TileKey::new(5, 2, 2);

        assert!(!set.accept(TileResult::Loaded {
            key,
            generation: stale,
            image: tile(),
        }));
        assert!(set.is_empty());

        assert!(set.accept(TileResult::Loaded {
            key,
            generation: current,
            image: tile(),
        }));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_status_distinguishes_loading_and_failed() {
        let config = RenderConfig::default();
        let mut set = TileSet::new();
        let generation = set.reset();
        set.range = Some(TileRange::covering(Point::new(10.5, 10.5), 5, PixelSize::new(256, 256), &config));

        let loaded = TileKey::new(5, 10, 10);
        let failed = TileKey::new(5, 11, 10);
        let loading = TileKey::new(5, 12, 10);

        set.accept(TileResult::Loaded {
            key: loaded,
            generation,
            image: tile(),
        });
        set.accept(TileResult::Failed {
            key: failed,
            generation,
            error: "timeout".into(),
        });

        assert_eq!(set.status(loaded), TileStatus::Loaded);
        assert_eq!(set.status(failed), TileStatus::Failed);
        assert_eq!(set.status(loading), TileStatus::Loading);
        assert_eq!(set.status(TileKey::new(5, 30, 30)), TileStatus::Absent);
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut set = TileSet::new();
        let key = TileKey::new(6, 3, 3);
        set.insert(key, tile());
        set.insert(key, tile());
        assert_eq!(set.len(), 1);
    }
}

use crate::{
    core::{
        config::{EngineConfig, RenderConfig},
        constants::TILE_SIZE,
        geo::{pixel_delta_to_lon_lat_delta, tile_to_lon_lat, LonLat, PixelSize, Point, TileKey},
        viewport::Viewport,
    },
    input::{Action, EventKind, EventManager, InteractionHandler, MapEvent, PointerEvent},
    rendering::RenderBuffer,
    search::Place,
    tiles::{TileFetcher, TileRange, TileSet, TileStatus},
    Result,
};
use image::RgbaImage;

/// The map engine.
///
/// Owns the viewport, the tile fetcher (and through it the disk cache),
/// the current tile set, the render buffer and the pointer state machine.
/// Every center or zoom change reloads the tile set and marks the buffer
/// stale before host listeners hear about it.
pub struct Map {
    viewport: Viewport,
    size: PixelSize,
    fetcher: TileFetcher,
    tiles: TileSet,
    buffer: RenderBuffer,
    input: InteractionHandler,
    event_manager: EventManager,
    render_config: RenderConfig,
}

impl Map {
    /// Creates a map fetching over HTTP into the configured disk cache
    pub fn new(config: &EngineConfig, size: PixelSize) -> Result<Self> {
        config.validate()?;
        let fetcher = TileFetcher::new(config)?;
        Ok(Self::with_fetcher(config, size, fetcher))
    }

    /// Creates a map around an existing fetcher and issues the first load
    pub fn with_fetcher(config: &EngineConfig, size: PixelSize, fetcher: TileFetcher) -> Self {
        let mut map = Self {
            viewport: Viewport::new(&config.view),
            size,
            fetcher,
            tiles: TileSet::new(),
            buffer: RenderBuffer::new(&config.render),
            input: InteractionHandler::new(),
            event_manager: EventManager::new(),
            render_config: config.render.clone(),
        };
        map.view_changed();
        map
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn center(&self) -> LonLat {
        self.viewport.center()
    }

    pub fn zoom(&self) -> u8 {
        self.viewport.zoom()
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn tile_set(&self) -> &TileSet {
        &self.tiles
    }

    pub fn fetcher(&self) -> &TileFetcher {
        &self.fetcher
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    /// True while downloads for any generation are outstanding
    pub fn is_loading(&self) -> bool {
        !self.fetcher.is_idle()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(kind, callback);
    }

    pub fn set_center(&mut self, lon: f64, lat: f64) -> bool {
        let changed = self.viewport.set_center(lon, lat);
        if changed {
            self.view_changed();
            self.event_manager.emit(MapEvent::CenterChanged {
                center: self.viewport.center(),
            });
            self.event_manager.emit(MapEvent::RepaintRequested);
        }
        self.dispatch();
        changed
    }

    pub fn set_zoom(&mut self, zoom: i32) -> bool {
        let changed = self.viewport.set_zoom(zoom);
        if changed {
            self.view_changed();
            self.event_manager.emit(MapEvent::ZoomChanged {
                zoom: self.viewport.zoom(),
            });
            self.event_manager.emit(MapEvent::RepaintRequested);
        }
        self.dispatch();
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom() as i32 + 1)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom() as i32 - 1)
    }

    /// Moves the center by a screen-space offset
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> bool {
        let center = self.viewport.center();
        let (d_lon, d_lat) = pixel_delta_to_lon_lat_delta(dx, dy, center.lat, self.viewport.zoom());
        self.set_center(center.lon + d_lon, center.lat + d_lat)
    }

    /// Centers on a search result
    pub fn center_on(&mut self, place: &Place) -> bool {
        log::info!("centering on {}", place.display_name);
        self.set_center(place.lon, place.lat)
    }

    pub fn resize(&mut self, size: PixelSize) -> bool {
        if size == self.size {
            return false;
        }
        log::debug!("resized to {}x{}", size.width, size.height);
        self.size = size;
        self.view_changed();
        self.event_manager.emit(MapEvent::RepaintRequested);
        self.dispatch();
        true
    }

    /// Feeds one pointer event through the interaction state machine
    pub fn handle_event(&mut self, event: PointerEvent) {
        for action in self.input.handle_event(event) {
            self.apply(action);
        }
        self.dispatch();
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::EnsureRendered => {
                self.buffer
                    .ensure_rendered(&self.tiles, self.viewport.center_tile(), self.size);
            }
            Action::Repaint => self.event_manager.emit(MapEvent::RepaintRequested),
            Action::CommitPan { dx, dy } => {
                self.pan_by_pixels(dx, dy);
            }
            Action::ZoomBy(levels) => {
                self.set_zoom(self.viewport.zoom() as i32 + levels);
            }
            Action::CenterAndZoomIn { position } => {
                let target = self.screen_to_lon_lat(position);
                self.set_center(target.lon, target.lat);
                self.zoom_in();
            }
            Action::PointerMoved { position } => {
                let position = self.screen_to_lon_lat(position);
                self.event_manager.emit(MapEvent::PointerMoved { position });
            }
        }
    }

    /// Picks up finished downloads. Call regularly from the host loop.
    ///
    /// Returns the number of tiles added to the current set.
    pub fn poll(&mut self) -> usize {
        let mut added = 0;
        for result in self.fetcher.try_recv_results() {
            if self.tiles.accept(result) {
                added += 1;
            }
        }
        if added > 0 {
            self.buffer.mark_stale();
            self.event_manager.emit(MapEvent::RepaintRequested);
        }
        self.dispatch();
        added
    }

    /// The frame to show, sized to the widget
    pub fn paint(&mut self) -> RgbaImage {
        self.buffer.paint(
            &self.tiles,
            self.viewport.center_tile(),
            self.size,
            self.input.drag_offset(),
        )
    }

    /// Converts a widget pixel to a coordinate, ignoring any drag in progress
    pub fn screen_to_lon_lat(&self, position: Point) -> LonLat {
        let center_tile = self.viewport.center_tile();
        let from_center = position.subtract(&self.size.center());
        let tile_size = TILE_SIZE as f64;
        tile_to_lon_lat(
            center_tile.x + from_center.x / tile_size,
            center_tile.y + from_center.y / tile_size,
            self.viewport.zoom(),
        )
    }

    pub fn tile_status(&self, key: TileKey) -> TileStatus {
        self.tiles.status(key)
    }

    /// Reloads the tile set for the current view and marks the buffer stale
    fn view_changed(&mut self) {
        let range = TileRange::covering(
            self.viewport.center_tile(),
            self.viewport.zoom(),
            self.size,
            &self.render_config,
        );
        self.tiles.reload(range, &mut self.fetcher);
        self.buffer.mark_stale();
    }

    fn dispatch(&mut self) {
        self.event_manager.process_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TileLoaderConfig;
    use crate::input::MouseButton;
    use crate::prelude::{Arc, Mutex};
    use crate::tiles::{TileCacheStore, TileDownloader};
    use crate::MapError;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl TileDownloader for Offline {
        async fn download(&self, _key: TileKey) -> Result<Vec<u8>> {
            Err(MapError::Runtime("offline".into()))
        }
    }

    fn offline_map(dir: &tempfile::TempDir, config: &EngineConfig) -> Map {
        let cache = TileCacheStore::open(dir.path(), None).unwrap();
        let fetcher =
            TileFetcher::with_downloader(Arc::new(Offline), cache, &TileLoaderConfig::for_testing());
        Map::with_fetcher(config, PixelSize::new(400, 300), fetcher)
    }

    #[tokio::test]
    async fn test_construction_loads_first_generation() {
        let dir = tempfile::tempdir().unwrap();
        let map = offline_map(&dir, &EngineConfig::default());
        assert_eq!(map.tile_set().generation(), 1);
        assert!(map.tile_set().range().is_some());
    }

    #[tokio::test]
    async fn test_unvalidated_config_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.view.max_longitude = -10.0;
        config.view.min_zoom = 12;
        config.view.max_zoom = 8;
        let map = offline_map(&dir, &config);
        assert_eq!(map.zoom(), 8);
        assert!(map.center().lon.abs() <= 180.0);
    }

    #[tokio::test]
    async fn test_non_finite_center_keeps_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        let center = map.center();
        let generation = map.tile_set().generation();
        let place = Place {
            display_name: "Nowhere".into(),
            lon: f64::NAN,
            lat: f64::NAN,
        };

        assert!(!map.center_on(&place));
        assert!(!map.pan_by_pixels(f64::NAN, 0.0));
        assert_eq!(map.center(), center);
        assert_eq!(map.tile_set().generation(), generation);
    }

    #[tokio::test]
    async fn test_no_op_writes_do_not_notify() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        let zoom_events = Arc::new(Mutex::new(0));
        let sink = zoom_events.clone();
        map.on(EventKind::ZoomChanged, move |_| *sink.lock().unwrap() += 1);

        assert!(map.set_zoom(7));
        assert!(!map.set_zoom(7));
        assert_eq!(*zoom_events.lock().unwrap(), 1);
        assert_eq!(map.tile_set().generation(), 2);
    }

    #[tokio::test]
    async fn test_screen_center_is_view_center() {
        let dir = tempfile::tempdir().unwrap();
        let map = offline_map(&dir, &EngineConfig::default());
        let at_center = map.screen_to_lon_lat(map.size().center());
        assert!((at_center.lon - map.center().lon).abs() < 1e-9);
        assert!((at_center.lat - map.center().lat).abs() < 1e-9);

        // One tile to the right is 360/2^10 degrees east
        let right = map.screen_to_lon_lat(Point::new(200.0 + 256.0, 150.0));
        assert!((right.lon - map.center().lon - 360.0 / 1024.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_double_click_centers_and_zooms() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        let target = map.screen_to_lon_lat(Point::new(300.0, 100.0));

        map.handle_event(PointerEvent::DoubleClick {
            position: Point::new(300.0, 100.0),
        });
        assert_eq!(map.zoom(), 11);
        assert!((map.center().lon - target.lon).abs() < 1e-9);
        assert!((map.center().lat - target.lat).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_pointer_moves_report_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        map.on(EventKind::PointerMoved, move |event| {
            if let MapEvent::PointerMoved { position } = event {
                *sink.lock().unwrap() = Some(*position);
            }
        });

        map.handle_event(PointerEvent::Move {
            position: map.size().center(),
        });
        let reported = seen.lock().unwrap().unwrap();
        assert!((reported.lon - map.center().lon).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_resize_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        assert!(!map.resize(PixelSize::new(400, 300)));
        assert!(map.resize(PixelSize::new(1024, 768)));
        assert_eq!(map.tile_set().generation(), 2);
        assert_eq!(map.paint().dimensions(), (1024, 768));
    }

    #[tokio::test]
    async fn test_right_drag_does_not_pan() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = offline_map(&dir, &EngineConfig::default());
        let before = map.center();
        let position = Point::new(10.0, 10.0);
        map.handle_event(PointerEvent::Down {
            position,
            button: MouseButton::Right,
        });
        map.handle_event(PointerEvent::Move {
            position: Point::new(200.0, 10.0),
        });
        map.handle_event(PointerEvent::Up {
            position: Point::new(200.0, 10.0),
            button: MouseButton::Right,
        });
        assert_eq!(map.center(), before);
    }
}

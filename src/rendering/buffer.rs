//! Oversized offscreen compositing buffer
//!
//! Tiles are blitted into a buffer `F` times the widget size in each
//! dimension, only when the buffer is stale. Painting then copies a widget
//! sized window out of it: the centred window when idle, a window shifted
//! by the drag offset while dragging. A drag therefore never re-renders
//! tiles, it only moves the window.

use crate::core::config::RenderConfig;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{PixelSize, Point};
use crate::tiles::set::TileSet;
use image::{imageops, Rgba, RgbaImage};

pub struct RenderBuffer {
    image: RgbaImage,
    stale: bool,
    oversize_factor: u32,
    background: Rgba<u8>,
}

impl RenderBuffer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            stale: true,
            oversize_factor: config.oversize_factor.max(1),
            background: Rgba(config.background),
        }
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The composited buffer as of the last render
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Buffer dimensions for a widget of `size`
    pub fn buffer_size(&self, size: PixelSize) -> PixelSize {
        size.scaled(self.oversize_factor)
    }

    /// Recomposites every tile around the fractional `center_tile`
    pub fn render(&mut self, tiles: &TileSet, center_tile: Point, size: PixelSize) {
        let buffer_size = self.buffer_size(size);
        let mut image = RgbaImage::from_pixel(buffer_size.width, buffer_size.height, self.background);
        let buffer_center = buffer_size.center();
        let tile_size = TILE_SIZE as f64;

        for (key, tile) in tiles.iter() {
            let x = buffer_center.x + (key.x as f64 - center_tile.x) * tile_size;
            let y = buffer_center.y + (key.y as f64 - center_tile.y) * tile_size;
            imageops::replace(&mut image, &**tile, x.floor() as i64, y.floor() as i64);
        }

        log::trace!(
            "rendered {} tiles into {}x{} buffer",
            tiles.len(),
            buffer_size.width,
            buffer_size.height
        );
        self.image = image;
        self.stale = false;
    }

    /// Renders if stale or if the widget size changed since the last render.
    /// Returns whether a render happened.
    pub fn ensure_rendered(&mut self, tiles: &TileSet, center_tile: Point, size: PixelSize) -> bool {
        let buffer_size = self.buffer_size(size);
        if self.stale || self.image.dimensions() != (buffer_size.width, buffer_size.height) {
            self.render(tiles, center_tile, size);
            return true;
        }
        false
    }

    /// Produces a widget sized frame.
    ///
    /// With `drag_offset` the buffer is drawn shifted by `-drag_offset`
    /// relative to the centred window; pixels the buffer no longer covers
    /// get the background colour.
    pub fn paint(
        &mut self,
        tiles: &TileSet,
        center_tile: Point,
        size: PixelSize,
        drag_offset: Option<Point>,
    ) -> RgbaImage {
        self.ensure_rendered(tiles, center_tile, size);

        let (buffer_width, buffer_height) = self.image.dimensions();
        let margin_x = (buffer_width - size.width) / 2;
        let margin_y = (buffer_height - size.height) / 2;

        match drag_offset {
            None => imageops::crop_imm(&self.image, margin_x, margin_y, size.width, size.height)
                .to_image(),
            Some(offset) => {
                let mut frame = RgbaImage::from_pixel(size.width, size.height, self.background);
                let x = -(offset.x.round() as i64) - margin_x as i64;
                let y = -(offset.y.round() as i64) - margin_y as i64;
                imageops::replace(&mut frame, &self.image, x, y);
                frame
            }
        }
    }
}

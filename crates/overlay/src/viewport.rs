use groundwork::math::geo::{GeoPoint, TilePoint};
use groundwork::math::mercator::{TileProjection, world_tiles};

/// Pixels per tile edge.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Buffer-local point in pixel (or ground-plane) units, relative to the
/// viewport's buffer origin.
///
/// CPU-side geometry stays in f64; this is the f32 boundary type handed
/// to rasterization and mesh output.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalPoint {
    pub x: f32,
    pub y: f32,
}

impl LocalPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One draw call's view of the map window.
///
/// Supplied fresh by the caller on every call; the engine keeps no
/// viewport state of its own.
///
/// Precondition: when the window crosses the antimeridian, the caller
/// must already have unwrapped `bottom_right` (one world-width added) so
/// its tile x is numerically greater than `top_left`'s.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
    pub zoom: u32,
    /// Tile coordinates of the buffer's top-left corner.
    pub buffer_origin: TilePoint,
    pub buffer_width_px: usize,
    pub buffer_height_px: usize,
}

impl Viewport {
    /// Build a viewport centered on `center` covering a
    /// `width_px` x `height_px` buffer.
    pub fn centered(
        center: GeoPoint,
        zoom: u32,
        width_px: usize,
        height_px: usize,
        projection: &dyn TileProjection,
    ) -> Viewport {
        let c = projection.to_tile(center, zoom);
        let half_w = width_px as f64 / TILE_SIZE_PX / 2.0;
        let half_h = height_px as f64 / TILE_SIZE_PX / 2.0;
        let origin = TilePoint::new(c.x - half_w, c.y - half_h);
        let corner = TilePoint::new(c.x + half_w, c.y + half_h);
        Viewport {
            top_left: projection.to_coords(origin, zoom),
            bottom_right: projection.to_coords(corner, zoom),
            zoom,
            buffer_origin: origin,
            buffer_width_px: width_px,
            buffer_height_px: height_px,
        }
    }

    /// Width of the projected world at this zoom, in tile units.
    pub fn world_tiles(&self) -> f64 {
        world_tiles(self.zoom)
    }

    /// The buffer's tile-space window: (top-left, bottom-right).
    pub fn tile_window(&self) -> (TilePoint, TilePoint) {
        let w = self.buffer_width_px as f64 / TILE_SIZE_PX;
        let h = self.buffer_height_px as f64 / TILE_SIZE_PX;
        (
            self.buffer_origin,
            TilePoint::new(self.buffer_origin.x + w, self.buffer_origin.y + h),
        )
    }
}

use groundwork::bounds::Aabb2;
use groundwork::geom::{distance_to_segment, point_in_polygon};
use groundwork::math::Vec2;
use groundwork::math::geo::GeoPoint;
use groundwork::math::mercator::TileProjection;

use crate::style::{Rgba8, StrokeStyle};
use crate::transform::{unwrap_follow, unwrap_initial};
use crate::viewport::{TILE_SIZE_PX, Viewport};

/// Tile-space segments longer than this are midpoint-split before the
/// per-pixel distance test, keeping it numerically stable at high zoom.
const SUBDIVIDE_MAX_TILES: f64 = 0.2;

/// Hard cap on subdivision recursion. The shrinking-segment condition
/// terminates well before this on sane input; the cap guards against
/// pathological near-duplicate points.
const MAX_SUBDIVIDE_DEPTH: u32 = 24;

/// Edge length of the block-fill acceleration grid, in pixels.
const FILL_BLOCK_PX: i64 = 11;

/// Borrowed view over a caller-owned flat RGBA8 buffer, row-major.
///
/// Every write is clamped to the buffer's bounds: a pixel whose computed
/// index would fall outside the buffer is skipped, never written. With
/// `invert_y`, row 0 addresses the bottom of the buffer instead of the
/// top; the flag is applied uniformly at the final index computation.
pub struct PixelSurface<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    invert_y: bool,
}

impl<'a> PixelSurface<'a> {
    pub fn new(data: &'a mut [u8], width: usize, height: usize, invert_y: bool) -> Self {
        Self {
            data,
            width,
            height,
            invert_y,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Blend `color` over the pixel at (x, y); out-of-bounds is a no-op.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let row = if self.invert_y {
            self.height - 1 - y as usize
        } else {
            y as usize
        };
        let idx = (row * self.width + x as usize) * 4;
        let Some(px) = self.data.get_mut(idx..idx + 4) else {
            return;
        };
        let a = color.a as i32;
        px[0] = blend_channel(px[0], color.r, a);
        px[1] = blend_channel(px[1], color.g, a);
        px[2] = blend_channel(px[2], color.b, a);
        px[3] = blend_channel(px[3], color.a, a);
    }
}

/// dst + (src - dst) * a / 255, the overlay blend used per channel.
fn blend_channel(dst: u8, src: u8, a: i32) -> u8 {
    (dst as i32 + (src as i32 - dst as i32) * a / 255) as u8
}

/// Stroke a geographic polyline into the surface.
///
/// Zero alpha or fewer than two points draws nothing. Each segment is
/// culled against the viewport window in tile units, midpoint-subdivided
/// down to `SUBDIVIDE_MAX_TILES`, and covered with a
/// distance-to-segment test of half the stroke width around the
/// centerline. The antimeridian-correct x is re-derived at every leaf
/// from a running previous-x accumulator, threaded through the recursion
/// by value.
pub fn stroke_polyline(
    surface: &mut PixelSurface,
    projection: &dyn TileProjection,
    viewport: &Viewport,
    points: &[GeoPoint],
    closed: bool,
    stroke: StrokeStyle,
) {
    if stroke.color.a == 0 || points.len() < 2 {
        return;
    }

    let world = viewport.world_tiles();
    let (win_min, win_max) = viewport.tile_window();
    let half_tiles = stroke.width_px as f64 * 0.5 / TILE_SIZE_PX;
    let window = Aabb2::new([win_min.x, win_min.y], [win_max.x, win_max.y]).expand(half_tiles);

    let n = points.len();
    let segments = if closed { n } else { n - 1 };

    let mut prev_x: Option<f64> = None;
    for i in 0..segments {
        let a = projection.to_tile(points[i], viewport.zoom);
        let b = projection.to_tile(points[(i + 1) % n], viewport.zoom);

        let ax = match prev_x {
            None => unwrap_initial(a.x, win_min.x, world),
            Some(px) => unwrap_follow(a.x, px, world),
        };
        let bx = unwrap_follow(b.x, ax, world);

        let seg = Aabb2::new([ax.min(bx), a.y.min(b.y)], [ax.max(bx), a.y.max(b.y)]);
        if !window.intersects(&seg) {
            prev_x = Some(bx);
            continue;
        }

        let acc = prev_x.unwrap_or(ax);
        let acc = draw_segment(surface, viewport, stroke, ax, a.y, bx, b.y, acc, 0);
        prev_x = Some(acc);
    }
}

/// Adaptive midpoint subdivision; returns the updated previous-x
/// accumulator.
#[allow(clippy::too_many_arguments)]
fn draw_segment(
    surface: &mut PixelSurface,
    viewport: &Viewport,
    stroke: StrokeStyle,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    prev_x: f64,
    depth: u32,
) -> f64 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    if depth < MAX_SUBDIVIDE_DEPTH && (dx * dx + dy * dy).sqrt() > SUBDIVIDE_MAX_TILES {
        let mx = (x0 + x1) * 0.5;
        let my = (y0 + y1) * 0.5;
        let acc = draw_segment(surface, viewport, stroke, x0, y0, mx, my, prev_x, depth + 1);
        return draw_segment(surface, viewport, stroke, mx, my, x1, y1, acc, depth + 1);
    }
    rasterize_leaf(surface, viewport, stroke, x0, y0, x1, y1, prev_x)
}

#[allow(clippy::too_many_arguments)]
fn rasterize_leaf(
    surface: &mut PixelSurface,
    viewport: &Viewport,
    stroke: StrokeStyle,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    prev_x: f64,
) -> f64 {
    let world = viewport.world_tiles();
    let x0 = unwrap_follow(x0, prev_x, world);
    let x1 = unwrap_follow(x1, x0, world);

    let origin = viewport.buffer_origin;
    let p0 = Vec2::new((x0 - origin.x) * TILE_SIZE_PX, (y0 - origin.y) * TILE_SIZE_PX);
    let p1 = Vec2::new((x1 - origin.x) * TILE_SIZE_PX, (y1 - origin.y) * TILE_SIZE_PX);

    let half = stroke.width_px as f64 * 0.5;
    let min_x = ((p0.x.min(p1.x) - half).floor() as i64).max(0);
    let min_y = ((p0.y.min(p1.y) - half).floor() as i64).max(0);
    let max_x = ((p0.x.max(p1.x) + half).ceil() as i64).min(surface.width() as i64 - 1);
    let max_y = ((p0.y.max(p1.y) + half).ceil() as i64).min(surface.height() as i64 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if distance_to_segment(p0, p1, pixel_center(x, y)) <= half {
                surface.blend(x, y, stroke.color);
            }
        }
    }

    x1
}

/// Fill a geographic polygon into the surface.
///
/// The raw vertex set is projected to pixel space (no subdivision) and
/// the clipped bounding box is scanned in `FILL_BLOCK_PX` blocks: when
/// all four corner tests agree, the whole block is filled or skipped in
/// one pass; otherwise the block falls back to per-pixel tests.
///
/// Known limitation: a polygon sliver that enters and exits a block
/// between two sampled corners is classified by the corners alone and
/// can be left unfilled.
pub fn fill_polygon(
    surface: &mut PixelSurface,
    projection: &dyn TileProjection,
    viewport: &Viewport,
    points: &[GeoPoint],
    color: Rgba8,
) {
    if color.a == 0 || points.len() < 3 {
        return;
    }

    let world = viewport.world_tiles();
    let (win_min, _) = viewport.tile_window();
    let origin = viewport.buffer_origin;

    let mut poly: Vec<Vec2> = Vec::with_capacity(points.len());
    let mut prev_x: Option<f64> = None;
    for p in points {
        let t = projection.to_tile(*p, viewport.zoom);
        let x = match prev_x {
            None => unwrap_initial(t.x, win_min.x, world),
            Some(px) => unwrap_follow(t.x, px, world),
        };
        prev_x = Some(x);
        poly.push(Vec2::new(
            (x - origin.x) * TILE_SIZE_PX,
            (t.y - origin.y) * TILE_SIZE_PX,
        ));
    }

    let Some(bounds) = Aabb2::from_points(&poly) else {
        return;
    };
    let min_x = (bounds.min[0].floor() as i64).max(0);
    let min_y = (bounds.min[1].floor() as i64).max(0);
    let max_x = (bounds.max[0].ceil() as i64).min(surface.width() as i64 - 1);
    let max_y = (bounds.max[1].ceil() as i64).min(surface.height() as i64 - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let mut by = min_y;
    while by <= max_y {
        let block_max_y = (by + FILL_BLOCK_PX - 1).min(max_y);
        let mut bx = min_x;
        while bx <= max_x {
            let block_max_x = (bx + FILL_BLOCK_PX - 1).min(max_x);
            fill_block(surface, &poly, bx, by, block_max_x, block_max_y, color);
            bx += FILL_BLOCK_PX;
        }
        by += FILL_BLOCK_PX;
    }
}

fn fill_block(
    surface: &mut PixelSurface,
    poly: &[Vec2],
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
    color: Rgba8,
) {
    let corners = [
        point_in_polygon(poly, pixel_center(min_x, min_y)),
        point_in_polygon(poly, pixel_center(max_x, min_y)),
        point_in_polygon(poly, pixel_center(min_x, max_y)),
        point_in_polygon(poly, pixel_center(max_x, max_y)),
    ];

    if corners.iter().all(|&c| c == corners[0]) {
        if corners[0] {
            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    surface.blend(x, y, color);
                }
            }
        }
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_polygon(poly, pixel_center(x, y)) {
                surface.blend(x, y, color);
            }
        }
    }
}

fn pixel_center(x: i64, y: i64) -> Vec2 {
    Vec2::new(x as f64 + 0.5, y as f64 + 0.5)
}

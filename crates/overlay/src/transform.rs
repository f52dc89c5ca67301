use groundwork::math::geo::GeoPoint;
use groundwork::math::mercator::TileProjection;

use crate::viewport::{LocalPoint, TILE_SIZE_PX, Viewport};

/// Interior points closer than this (tile units) to the previously kept
/// point are dropped when deduplication is requested.
pub const MIN_POINT_SPACING_TILES: f64 = 1e-3;

/// Unwrap the first projected x of a path into the viewport's frame.
///
/// More than a quarter world-width left of the origin pulls the point one
/// world right; more than three quarters to the right pushes it one world
/// left.
pub(crate) fn unwrap_initial(x: f64, origin_x: f64, world: f64) -> f64 {
    let dx = x - origin_x;
    if dx < -0.25 * world {
        x + world
    } else if dx > 0.75 * world {
        x - world
    } else {
        x
    }
}

/// Keep whichever of `x`, `x + world`, `x - world` lies closest to `prev`.
///
/// Applied to every point after the first, this keeps a path continuous
/// across the antimeridian without ever introducing a full-world jump.
pub(crate) fn unwrap_follow(x: f64, prev: f64, world: f64) -> f64 {
    let mut best = x;
    for cand in [x + world, x - world] {
        if (cand - prev).abs() < (best - prev).abs() {
            best = cand;
        }
    }
    best
}

/// Convert a geographic path into buffer-local pixel points.
///
/// The path is unwrapped continuously across the antimeridian, the
/// closing point is appended when `closed`, and interior near-duplicates
/// are dropped when `drop_near_duplicates` is set. Endpoints are never
/// dropped. The output is at most one longer than the input (the closing
/// point), otherwise the same length or shorter.
pub fn to_local_points(
    points: &[GeoPoint],
    viewport: &Viewport,
    projection: &dyn TileProjection,
    closed: bool,
    drop_near_duplicates: bool,
) -> Vec<LocalPoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let world = viewport.world_tiles();
    let origin = viewport.buffer_origin;
    let n = points.len();
    let total = if closed { n + 1 } else { n };

    let mut out: Vec<LocalPoint> = Vec::with_capacity(total);
    let mut prev: Option<(f64, f64)> = None;

    for k in 0..total {
        let i = if k == n { 0 } else { k };
        let t = projection.to_tile(points[i], viewport.zoom);
        let x = match prev {
            None => unwrap_initial(t.x, origin.x, world),
            Some((px, _)) => unwrap_follow(t.x, px, world),
        };

        if drop_near_duplicates && k > 0 && k < total - 1 {
            if let Some((px, py)) = prev {
                let dx = x - px;
                let dy = t.y - py;
                if (dx * dx + dy * dy).sqrt() < MIN_POINT_SPACING_TILES {
                    continue;
                }
            }
        }

        prev = Some((x, t.y));
        out.push(LocalPoint::new(
            ((x - origin.x) * TILE_SIZE_PX) as f32,
            ((t.y - origin.y) * TILE_SIZE_PX) as f32,
        ));
    }

    out
}

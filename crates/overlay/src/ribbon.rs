use groundwork::geom::{LineRelation, line_intersection, segment_intersection};
use groundwork::math::Vec2;
use groundwork::math::angle::{angle2d, direction};

use crate::viewport::LocalPoint;

/// A miter point farther than this many stroke widths from its vertex is
/// pulled back along the same direction.
const MITER_CLAMP_WIDTHS: f64 = 2.0;

/// Crossing points closer together than this are treated as one (a
/// segment passing exactly through a rectangle corner hits two edges).
const CROSSING_MERGE_EPS: f64 = 1e-9;

/// Stroked-polyline mesh: parallel vertex/normal/uv buffers plus a
/// triangle-list index buffer. Grows by 4 vertices / 6 indices per
/// emitted segment. Rebuilt from scratch each draw call; the builder
/// appends and never reads prior contents.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.uvs.clear();
        self.indices.clear();
    }
}

/// Build a stroked ribbon for `points` (ground-plane units), clipped to
/// the rectangle (0, 0)..(rect_w, rect_h), and append it to `mesh`.
///
/// `width` is the centerline-to-edge distance. Each vertex's height comes
/// from `elevation(x, z)`, called once per emitted vertex; flat callers
/// pass a constant-zero callback. Chains with fewer than 2 points after
/// clipping contribute nothing.
///
/// Only the stroke ribbon is produced; polygon interior fill in mesh mode
/// is an extension point, not part of this builder.
pub fn build_ribbon<F>(
    mesh: &mut RibbonMesh,
    points: &[LocalPoint],
    width: f32,
    rect_w: f32,
    rect_h: f32,
    elevation: &mut F,
) where
    F: FnMut(f32, f32) -> f32,
{
    if points.len() < 2 {
        return;
    }

    let w = rect_w as f64;
    let h = rect_h as f64;
    let width = width as f64;
    let pts: Vec<Vec2> = points
        .iter()
        .map(|p| Vec2::new(p.x as f64, p.y as f64))
        .collect();

    let mut active: Vec<Vec2> = Vec::new();
    for i in 0..pts.len() - 1 {
        let a = pts[i];
        let b = pts[i + 1];
        let a_in = inside_rect(a, w, h);
        let b_in = inside_rect(b, w, h);

        match (a_in, b_in) {
            (true, true) => {
                if active.is_empty() {
                    active.push(a);
                }
                active.push(b);
            }
            (true, false) => {
                // Leaving the viewport: splice in the exit crossing and
                // close out the chain.
                if active.is_empty() {
                    active.push(a);
                }
                if let Some(exit) = nearest_crossing(a, b, w, h, a) {
                    active.push(exit);
                }
                emit_chain(mesh, &active, width, elevation);
                active.clear();
            }
            (false, true) => {
                // Entering the viewport: start a fresh chain at the entry
                // crossing.
                emit_chain(mesh, &active, width, elevation);
                active.clear();
                if let Some(entry) = nearest_crossing(a, b, w, h, b) {
                    active.push(entry);
                }
                active.push(b);
            }
            (false, false) => {
                // The segment may still pass through the viewport; a
                // traversal contributes a detached two-point chain,
                // ordered from the `a` side.
                let crossings = rect_crossings(a, b, w, h);
                if crossings.len() >= 2 {
                    let mut pair = [crossings[0], crossings[1]];
                    if (pair[1] - a).length() < (pair[0] - a).length() {
                        pair.swap(0, 1);
                    }
                    emit_chain(mesh, &pair, width, elevation);
                }
            }
        }
    }

    emit_chain(mesh, &active, width, elevation);
}

fn inside_rect(p: Vec2, w: f64, h: f64) -> bool {
    p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h
}

/// Crossings of the segment `a`-`b` with the rectangle boundary,
/// corner duplicates merged.
fn rect_crossings(a: Vec2, b: Vec2, w: f64, h: f64) -> Vec<Vec2> {
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(w, 0.0),
        Vec2::new(w, h),
        Vec2::new(0.0, h),
    ];
    let mut hits: Vec<Vec2> = Vec::new();
    for k in 0..4 {
        match segment_intersection(a, b, corners[k], corners[(k + 1) % 4]) {
            LineRelation::Point(p) => {
                if !hits.iter().any(|q| (*q - p).length() < CROSSING_MERGE_EPS) {
                    hits.push(p);
                }
            }
            // A run along an edge contributes no crossing point; the
            // endpoints themselves decide chain membership.
            LineRelation::None | LineRelation::Degenerate => {}
        }
    }
    hits
}

fn nearest_crossing(a: Vec2, b: Vec2, w: f64, h: f64, to: Vec2) -> Option<Vec2> {
    rect_crossings(a, b, w, h)
        .into_iter()
        .min_by(|p, q| {
            let dp = (*p - to).length();
            let dq = (*q - to).length();
            dp.partial_cmp(&dq).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Emit one clipped chain as a quad-strip ribbon.
fn emit_chain<F>(mesh: &mut RibbonMesh, chain: &[Vec2], width: f64, elevation: &mut F)
where
    F: FnMut(f32, f32) -> f32,
{
    if chain.len() < 2 {
        return;
    }

    let n = chain.len();
    let mut left: Vec<Vec2> = Vec::with_capacity(n);
    let mut right: Vec<Vec2> = Vec::with_capacity(n);

    for i in 0..n {
        let (l, r) = if i == 0 {
            end_offsets(chain[0], chain[1], chain[0], width)
        } else if i == n - 1 {
            end_offsets(chain[n - 2], chain[n - 1], chain[n - 1], width)
        } else {
            miter_offsets(chain[i - 1], chain[i], chain[i + 1], width)
        };
        left.push(l);
        right.push(r);
    }

    for i in 0..n - 1 {
        push_quad(mesh, left[i], right[i], left[i + 1], right[i + 1], elevation);
    }
}

/// Plain perpendicular side points at `at` for the edge `a` -> `b`; used
/// for open-chain endpoints and as the parallel-edge fallback.
fn end_offsets(a: Vec2, b: Vec2, at: Vec2, width: f64) -> (Vec2, Vec2) {
    let ang = angle2d(a, b);
    (
        at + direction(ang - 90.0) * width,
        at + direction(ang + 90.0) * width,
    )
}

/// True miter side points at an interior vertex: per side, intersect the
/// previous edge's outgoing offset line with the next edge's incoming
/// offset line. Parallel edges fall back to the plain perpendicular
/// offset; a miter farther than `MITER_CLAMP_WIDTHS` stroke widths from
/// the vertex is pulled back to that distance along the same direction.
fn miter_offsets(prev: Vec2, at: Vec2, next: Vec2, width: f64) -> (Vec2, Vec2) {
    let ang0 = angle2d(prev, at);
    let ang1 = angle2d(at, next);

    let mut sides = [Vec2::new(0.0, 0.0); 2];
    for (slot, side) in [-90.0, 90.0].into_iter().enumerate() {
        let off0 = direction(ang0 + side) * width;
        let off1 = direction(ang1 + side) * width;
        sides[slot] = match line_intersection(prev + off0, at + off0, at + off1, next + off1) {
            Some(m) => clamp_miter(at, m, width),
            None => at + off0,
        };
    }
    (sides[0], sides[1])
}

fn clamp_miter(at: Vec2, m: Vec2, width: f64) -> Vec2 {
    let d = m - at;
    let len = d.length();
    let max = MITER_CLAMP_WIDTHS * width;
    if len > max && len > 0.0 {
        at + d * (max / len)
    } else {
        m
    }
}

fn push_quad<F>(mesh: &mut RibbonMesh, l0: Vec2, r0: Vec2, l1: Vec2, r1: Vec2, elevation: &mut F)
where
    F: FnMut(f32, f32) -> f32,
{
    let base = mesh.vertices.len() as u32;
    for (p, uv) in [
        (l0, [0.0, 0.0]),
        (r0, [1.0, 0.0]),
        (l1, [0.0, 1.0]),
        (r1, [1.0, 1.0]),
    ] {
        let x = p.x as f32;
        let z = p.y as f32;
        mesh.vertices.push([x, elevation(x, z), z]);
        mesh.normals.push([0.0, 1.0, 0.0]);
        mesh.uvs.push(uv);
    }
    mesh.indices
        .extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
}

use crate::math::Vec2;

/// Tolerance on the cross-product denominator below which two lines are
/// treated as parallel or degenerate.
const PARALLEL_EPS: f64 = 1e-12;

/// Relation between two 2D segments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LineRelation {
    /// The segments do not touch within their extents.
    None,
    /// The segments cross at a single point.
    Point(Vec2),
    /// Parallel, collinear, or zero-length input.
    Degenerate,
}

/// Intersection of the infinite lines through `a1`-`a2` and `b1`-`b2`.
///
/// Returns `None` for parallel or degenerate input; each call site
/// supplies its own fallback (miter joins fall back to the plain
/// perpendicular offset).
pub fn line_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = ((b1.x - a1.x) * d2.y - (b1.y - a1.y) * d2.x) / denom;
    Some(a1 + d1 * t)
}

/// Tri-state segment/segment intersection.
///
/// Callers must branch on all three outcomes; `Degenerate` covers
/// parallel and collinear overlap alike and deliberately reports no
/// crossing point.
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> LineRelation {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < PARALLEL_EPS {
        return LineRelation::Degenerate;
    }
    let t = ((b1.x - a1.x) * d2.y - (b1.y - a1.y) * d2.x) / denom;
    let u = ((b1.x - a1.x) * d1.y - (b1.y - a1.y) * d1.x) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return LineRelation::None;
    }
    LineRelation::Point(a1 + d1 * t)
}

use earcutr::earcut;

use crate::math::Vec2;

/// Triangulate a simple polygon into an index list (three indices per
/// triangle) into `points`.
///
/// Only simple (non-self-intersecting) outlines are supported; the result
/// for self-intersecting input is unspecified. A repeated closing vertex
/// is dropped before triangulation. Degenerate input and triangulation
/// failures yield an empty list.
pub fn triangulate(points: &[Vec2]) -> Vec<u32> {
    let mut pts: Vec<Vec2> = points.to_vec();
    drop_closing_duplicate(&mut pts);
    if pts.len() < 3 {
        return Vec::new();
    }

    let mut coords: Vec<f64> = Vec::with_capacity(pts.len() * 2);
    for p in &pts {
        coords.push(p.x);
        coords.push(p.y);
    }
    let holes: Vec<usize> = Vec::new();

    match earcut(&coords, &holes, 2) {
        Ok(ix) => ix.into_iter().map(|i| i as u32).collect(),
        Err(_) => Vec::new(),
    }
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = *points.last().unwrap();
        if (first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9 {
            points.pop();
        }
    }
}

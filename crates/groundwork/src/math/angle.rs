use super::Vec2;

/// Direction from `a` to `b` in degrees, [0, 360), measured clockwise
/// from +Y.
///
/// The stroke-join logic and the side-offset logic both go through this
/// one helper so their angle conventions cannot drift apart.
pub fn angle2d(a: Vec2, b: Vec2) -> f64 {
    let d = b - a;
    let deg = d.x.atan2(d.y).to_degrees();
    if deg < 0.0 { deg + 360.0 } else { deg }
}

/// Unit vector for a clockwise-from-+Y angle in degrees.
pub fn direction(deg: f64) -> Vec2 {
    let rad = deg.to_radians();
    Vec2::new(rad.sin(), rad.cos())
}

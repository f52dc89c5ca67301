use crate::math::Vec2;

/// Axis-aligned bounding box
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Tight bounds over a point set; `None` when empty.
    pub fn from_points(points: &[Vec2]) -> Option<Aabb2> {
        let first = points.first()?;
        let mut b = Aabb2::new([first.x, first.y], [first.x, first.y]);
        for p in &points[1..] {
            b.min[0] = b.min[0].min(p.x);
            b.min[1] = b.min[1].min(p.y);
            b.max[0] = b.max[0].max(p.x);
            b.max[1] = b.max[1].max(p.y);
        }
        Some(b)
    }

    pub fn expand(self, margin: f64) -> Aabb2 {
        Aabb2::new(
            [self.min[0] - margin, self.min[1] - margin],
            [self.max[0] + margin, self.max[1] + margin],
        )
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}

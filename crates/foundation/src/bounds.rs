use crate::math::Vec2;

/// Axis-aligned bounding box in pixel space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn from_point(p: Vec2) -> Self {
        Aabb2::new([p.x, p.y], [p.x, p.y])
    }

    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = points.first()?;
        let mut out = Aabb2::from_point(*first);
        for p in points.iter().skip(1) {
            out.extend(*p);
        }
        Some(out)
    }

    pub fn extend(&mut self, p: Vec2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn from_points_covers_every_point() {
        let pts = vec![
            Vec2::new(3.0, -1.0),
            Vec2::new(-2.0, 4.0),
            Vec2::new(0.5, 0.5),
        ];
        let b = Aabb2::from_points(&pts).unwrap();
        assert_eq!(b.min, [-2.0, -1.0]);
        assert_eq!(b.max, [3.0, 4.0]);
        assert!(pts.iter().all(|p| b.contains(*p)));
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb2::from_points(&[]).is_none());
    }
}

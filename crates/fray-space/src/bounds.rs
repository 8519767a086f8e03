//! Axis-aligned world-space rectangle of one zone.

use fray_core::Vec2;

/// Half-open rectangle `[min, max)` in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneBounds {
    /// Top-left corner (the zone origin).
    pub min: Vec2,
    /// Bottom-right corner, exclusive.
    pub max: Vec2,
}

impl ZoneBounds {
    /// Square bounds of side `size` starting at `origin`.
    pub fn square(origin: Vec2, size: f32) -> Self {
        Self {
            min: origin,
            max: origin + Vec2::splat(size),
        }
    }

    /// Whether `p` lies inside the rectangle.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Clamp `p` into the rectangle, one pixel short of the far edges.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min.x, self.max.x - 1.0),
            p.y.clamp(self.min.y, self.max.y - 1.0),
        )
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Centre point.
    pub fn centre(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether the circle at `centre` with `radius` lies entirely inside.
    pub fn encloses(&self, centre: Vec2, radius: f32) -> bool {
        centre.x - radius >= self.min.x
            && centre.x + radius < self.max.x
            && centre.y - radius >= self.min.y
            && centre.y + radius < self.max.y
    }

    /// Position relative to the origin.
    pub fn local(&self, p: Vec2) -> Vec2 {
        p - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_open() {
        let b = ZoneBounds::square(Vec2::new(100.0, 100.0), 50.0);
        assert!(b.contains(Vec2::new(100.0, 100.0)));
        assert!(!b.contains(Vec2::new(150.0, 120.0)));
        assert!(b.contains(b.clamp(Vec2::new(500.0, -3.0))));
        assert_eq!(b.centre(), Vec2::new(125.0, 125.0));
    }

    #[test]
    fn encloses_circles_clear_of_every_edge() {
        let b = ZoneBounds::square(Vec2::ZERO, 100.0);
        assert!(b.encloses(Vec2::splat(50.0), 20.0));
        assert!(!b.encloses(Vec2::new(90.0, 50.0), 20.0));
        assert!(!b.encloses(Vec2::new(50.0, 5.0), 10.0));
    }
}

//! Frame-scoped label collision tracking.

use nalgebra::Point2;

/// Axis-aligned bounding box of a placed label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CollisionBox {
    /// Builds a box of `width`×`height` centered on `center`.
    pub fn centered(center: Point2<f32>, width: f32, height: f32) -> Self {
        Self {
            x1: center.x - width / 2.0,
            y1: center.y - height / 2.0,
            x2: center.x + width / 2.0,
            y2: center.y + height / 2.0,
        }
    }

    /// Returns whether two boxes overlap.
    pub fn intersects(&self, other: &CollisionBox) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }
}

/// Ordered list of the boxes placed so far this frame.
///
/// Created empty at frame start, appended to as labels are placed, discarded
/// (cleared) at the next frame start. Placement order matters: the first
/// label to claim an area wins it, later labels must move or drop.
#[derive(Debug, Default)]
pub struct CollisionRegistry {
    boxes: Vec<CollisionBox>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all boxes for a new frame.
    pub fn reset(&mut self) {
        self.boxes.clear();
    }

    /// Returns whether `candidate` overlaps any already-registered box.
    pub fn would_collide(&self, candidate: &CollisionBox) -> bool {
        self.boxes.iter().any(|b| b.intersects(candidate))
    }

    /// Registers a placed label's box.
    pub fn register(&mut self, placed: CollisionBox) {
        self.boxes.push(placed);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    #[inline]
    pub fn boxes(&self) -> &[CollisionBox] {
        &self.boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detection() {
        let a = CollisionBox::centered(Point2::new(0.0, 0.0), 10.0, 10.0);
        let b = CollisionBox::centered(Point2::new(8.0, 0.0), 10.0, 10.0);
        let c = CollisionBox::centered(Point2::new(20.0, 0.0), 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        // Exactly touching edges do not count as overlap.
        let d = CollisionBox::centered(Point2::new(10.0, 0.0), 10.0, 10.0);
        assert!(!a.intersects(&d));
    }

    #[test]
    fn registry_lifecycle() {
        let mut reg = CollisionRegistry::new();
        let b = CollisionBox::centered(Point2::new(0.0, 0.0), 10.0, 10.0);
        assert!(!reg.would_collide(&b));
        reg.register(b);
        assert!(reg.would_collide(&b));
        reg.reset();
        assert!(reg.is_empty());
        assert!(!reg.would_collide(&b));
    }
}

use super::point::Point;
use serde::{Deserialize, Serialize};

/// An inclusive axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn from_point(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    pub fn grow(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_expands_to_cover_new_point() {
        let mut bb = BoundingBox::from_point(Point::new(2, 2));
        bb.grow(Point::new(0, 5));
        assert_eq!(bb.min_x, 0);
        assert_eq!(bb.max_x, 2);
        assert_eq!(bb.min_y, 2);
        assert_eq!(bb.max_y, 5);
    }

    #[test]
    fn overlaps_detects_disjoint_boxes() {
        let a = BoundingBox {
            min_x: 0,
            min_y: 0,
            max_x: 2,
            max_y: 2,
        };
        let b = BoundingBox {
            min_x: 3,
            min_y: 3,
            max_x: 4,
            max_y: 4,
        };
        assert!(!a.overlaps(&b));
        let c = BoundingBox {
            min_x: 2,
            min_y: 2,
            max_x: 5,
            max_y: 5,
        };
        assert!(a.overlaps(&c));
    }
}

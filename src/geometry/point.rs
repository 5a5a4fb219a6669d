use serde::{Deserialize, Serialize};

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(&self, other: &Point) -> i64 {
        ((self.x - other.x).abs() as i64) + ((self.y - other.y).abs() as i64)
    }

    pub fn chebyshev_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_sum_of_abs_deltas() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(a.manhattan_distance(&b), 7);
    }

    #[test]
    fn chebyshev_distance_is_max_of_abs_deltas() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(a.chebyshev_distance(&b), 4);
    }
}

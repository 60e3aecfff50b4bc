use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct representing a simple 2D point in physical units.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance from this point to the line through `a` and `b`.
    /// Falls back to the distance to `a` when the two ends coincide.
    pub fn distance_to_line(&self, a: &Point, b: &Point) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            return ((self.x - a.x).powi(2) + (self.y - a.y).powi(2)).sqrt();
        }
        ((self.x - a.x) * dy - (self.y - a.y) * dx).abs() / length
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point {{ x: {}, y: {} }}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_horizontal_line() {
        let p = Point::new(1.0, 3.0);
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((p.distance_to_line(&a, &b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn distance_to_degenerate_line() {
        let p = Point::new(3.0, 4.0);
        let a = Point::new(0.0, 0.0);
        assert!((p.distance_to_line(&a, &a) - 5.0).abs() < 1e-12);
    }
}

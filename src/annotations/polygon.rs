use serde::{Deserialize, Serialize};

use crate::annotations::point::Point;

/// A closed polygon contour in physical units.
///
/// Vertices are listed once, in tracing order; the edge from the last vertex
/// back to the first is implied.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    /// Signed shoelace area; positive when the vertices wind counterclockwise
    /// in a y-down image frame.
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..self.points.len() {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % self.points.len()];
            area += a.x * b.y - b.x * a.y;
        }
        area / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area() {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!((square.signed_area().abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_polygon_has_zero_area() {
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert_eq!(line.signed_area(), 0.0);
    }
}

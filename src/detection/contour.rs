use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use itertools::Itertools;

use crate::annotations::point::Point;

/// Traces the outer border of one connected region.
///
/// Input pixels are (x, y, _) coordinates local to the volume; the returned
/// vertices are in the same pixel coordinates, ordered along the border.
/// Returns `None` for regions too degenerate to trace (never the case for a
/// non-empty 4-connected region, but the caller falls back to a bare point).
pub(crate) fn trace_region_contour(pixels: &[[usize; 3]]) -> Option<Vec<Point>> {
    let (min_x, max_x) = pixels.iter().map(|p| p[0]).minmax().into_option()?;
    let (min_y, max_y) = pixels.iter().map(|p| p[1]).minmax().into_option()?;
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;

    let mut mask = GrayImage::new(width, height);
    for p in pixels {
        mask.put_pixel((p[0] - min_x) as u32, (p[1] - min_y) as u32, Luma([255]));
    }

    let contours = find_contours::<i32>(&mask);
    let outer = contours
        .into_iter()
        .find(|c| c.border_type == BorderType::Outer)?;
    Some(
        outer
            .points
            .into_iter()
            .map(|p| {
                Point::new(
                    p.x as f64 + min_x as f64,
                    p.y as f64 + min_y as f64,
                )
            })
            .collect(),
    )
}

/// Ramer-Douglas-Peucker polyline simplification: keeps the two ends and
/// every intermediate vertex farther than `tolerance` from the current
/// approximation.
pub(crate) fn ramer_douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    let mut segments = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = segments.pop() {
        let mut farthest = 0.0;
        let mut split = None;
        for i in first + 1..last {
            let distance = points[i].distance_to_line(&points[first], &points[last]);
            if distance > farthest {
                farthest = distance;
                split = Some(i);
            }
        }
        if let Some(i) = split {
            if farthest > tolerance {
                keep[i] = true;
                segments.push((first, i));
                segments.push((i, last));
            }
        }
    }
    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplifies a closed contour. The polygon is closed by duplicating the
/// first vertex during the run; the duplicate is dropped again afterwards.
pub(crate) fn simplify_closed_contour(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 3 {
        return points.to_vec();
    }
    let mut closed = points.to_vec();
    closed.push(points[0]);
    let mut reduced = ramer_douglas_peucker(&closed, tolerance);
    reduced.pop();
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_square_border() {
        // 3x3 block at (2..5, 1..4).
        let mut pixels = Vec::new();
        for y in 1..4 {
            for x in 2..5 {
                pixels.push([x, y, 0]);
            }
        }
        let contour = trace_region_contour(&pixels).unwrap();
        assert!(!contour.is_empty());
        // All border pixels of the block, none of the interior.
        assert!(contour.iter().all(|p| {
            p.x >= 2.0 && p.x <= 4.0 && p.y >= 1.0 && p.y <= 3.0
        }));
        assert!(!contour.contains(&Point::new(3.0, 2.0)));
    }

    #[test]
    fn single_pixel_region_traces_to_one_point() {
        let contour = trace_region_contour(&[[5, 7, 0]]).unwrap();
        assert_eq!(contour, vec![Point::new(5.0, 7.0)]);
    }

    #[test]
    fn rdp_drops_collinear_vertices() {
        let line: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0)).collect();
        let reduced = ramer_douglas_peucker(&line, 0.5);
        assert_eq!(reduced, vec![Point::new(0.0, 0.0), Point::new(9.0, 0.0)]);
    }

    #[test]
    fn rdp_keeps_a_corner() {
        let corner = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
        ];
        let reduced = ramer_douglas_peucker(&corner, 0.5);
        assert_eq!(reduced.len(), 3);
    }

    #[test]
    fn simplify_closed_square_keeps_corners() {
        // Dense border of an axis-aligned square.
        let mut dense = Vec::new();
        for x in 0..=4 {
            dense.push(Point::new(x as f64, 0.0));
        }
        for y in 1..=4 {
            dense.push(Point::new(4.0, y as f64));
        }
        for x in (0..4).rev() {
            dense.push(Point::new(x as f64, 4.0));
        }
        for y in (1..4).rev() {
            dense.push(Point::new(0.0, y as f64));
        }
        let reduced = simplify_closed_contour(&dense, 0.5);
        assert!(reduced.len() < dense.len());
        for corner in [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ] {
            assert!(reduced.contains(&corner), "missing corner {}", corner);
        }
    }
}

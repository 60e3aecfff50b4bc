use crate::errors::DetectError;

/// An axis-aligned integer box with inclusive per-axis bounds.
///
/// Axis order is (x, y) in 2D and (x, y, z) in 3D. Intervals serve two roles:
/// the region to crop out of a source image, and the placement of a computed
/// probability volume back into the coordinate frame of that image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    min: Vec<i64>,
    max: Vec<i64>,
}

impl Interval {
    /// Checks bounds before constructing: 2 or 3 axes, `min <= max` on each.
    pub fn new(min: Vec<i64>, max: Vec<i64>) -> Result<Self, DetectError> {
        if min.len() != max.len() {
            return Err(DetectError::InvalidInterval(format!(
                "min has {} axes but max has {} axes.",
                min.len(),
                max.len()
            )));
        }
        if min.len() < 2 || min.len() > 3 {
            return Err(DetectError::InvalidInterval(format!(
                "expected 2 or 3 axes, got {}.",
                min.len()
            )));
        }
        for d in 0..min.len() {
            if min[d] > max[d] {
                return Err(DetectError::InvalidInterval(format!(
                    "min > max on axis {} ({} > {}).",
                    d, min[d], max[d]
                )));
            }
        }
        Ok(Interval { min, max })
    }

    /// The zero-origin interval covering `extents` pixels per axis,
    /// axis order (x, y[, z]).
    pub fn from_extents(extents: &[usize]) -> Result<Self, DetectError> {
        let min = vec![0; extents.len()];
        let max = extents
            .iter()
            .map(|&e| {
                if e == 0 {
                    Err(DetectError::InvalidInterval(
                        "zero extent axis.".to_string(),
                    ))
                } else {
                    Ok(e as i64 - 1)
                }
            })
            .collect::<Result<Vec<i64>, _>>()?;
        Interval::new(min, max)
    }

    pub fn num_dimensions(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self, d: usize) -> i64 {
        self.min[d]
    }

    pub fn max(&self, d: usize) -> i64 {
        self.max[d]
    }

    /// Number of pixels along axis `d`.
    pub fn extent(&self, d: usize) -> usize {
        (self.max[d] - self.min[d] + 1) as usize
    }

    pub fn extents(&self) -> Vec<usize> {
        (0..self.num_dimensions()).map(|d| self.extent(d)).collect()
    }

    /// Total number of pixels covered.
    pub fn num_elements(&self) -> usize {
        self.extents().iter().product()
    }
}

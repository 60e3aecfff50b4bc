use ndarray::ArrayD;

use crate::errors::DetectError;
use crate::image_utils::interval::Interval;

/// A dense per-pixel probability map placed at an explicit position in the
/// coordinate frame of the source image.
///
/// Samples are stored zero-based as ([z,] y, x); the world position of sample
/// `(x, y[, z])` is `interval.min(d) + index` on each axis. One volume exists
/// at a time per runner instance, replaced wholesale on each recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVolume {
    data: ArrayD<f32>,
    interval: Interval,
}

impl ProbabilityVolume {
    pub(crate) fn new(data: ArrayD<f32>, interval: Interval) -> Result<Self, DetectError> {
        let ndim = data.ndim();
        if interval.num_dimensions() != ndim {
            return Err(DetectError::InvalidInterval(format!(
                "volume has {} axes but its interval has {}.",
                ndim,
                interval.num_dimensions()
            )));
        }
        for d in 0..ndim {
            let size = data.shape()[ndim - 1 - d];
            if size != interval.extent(d) {
                return Err(DetectError::InvalidInterval(format!(
                    "axis {} extent {} does not match interval extent {}.",
                    d,
                    size,
                    interval.extent(d)
                )));
            }
        }
        Ok(ProbabilityVolume { data, interval })
    }

    /// Bounding box in the source image's coordinate frame.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn num_dimensions(&self) -> usize {
        self.data.ndim()
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Probability at world coordinates (x, y[, z]), or `None` outside the
    /// volume's interval.
    pub fn value_at(&self, world: &[i64]) -> Option<f32> {
        let ndim = self.data.ndim();
        if world.len() != ndim {
            return None;
        }
        let mut index = vec![0usize; ndim];
        for d in 0..ndim {
            let offset = world[d] - self.interval.min(d);
            if offset < 0 || offset >= self.interval.extent(d) as i64 {
                return None;
            }
            index[ndim - 1 - d] = offset as usize;
        }
        Some(self.data[index.as_slice()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn rejects_extent_mismatch() {
        let data = Array::zeros(IxDyn(&[4, 5]));
        let iv = Interval::new(vec![0, 0], vec![4, 4]).unwrap();
        assert!(ProbabilityVolume::new(data, iv).is_err());
    }

    #[test]
    fn value_at_maps_world_coordinates() {
        let mut data = Array::zeros(IxDyn(&[3, 4]));
        data[[1, 2]] = 0.75;
        let iv = Interval::new(vec![10, 20], vec![13, 22]).unwrap();
        let volume = ProbabilityVolume::new(data, iv).unwrap();

        assert_eq!(volume.value_at(&[12, 21]), Some(0.75));
        assert_eq!(volume.value_at(&[10, 20]), Some(0.0));
        assert_eq!(volume.value_at(&[9, 20]), None);
        assert_eq!(volume.value_at(&[14, 20]), None);
        assert_eq!(volume.value_at(&[12, 21, 0]), None);
    }
}

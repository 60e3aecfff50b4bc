use ndarray::{ArrayD, Axis, Slice};

use crate::errors::DetectError;
use crate::image_utils::interval::Interval;

/// A single-channel, single-frame 2D or 3D image with physical pixel sizes.
///
/// Samples are stored row-major as ([z,] y, x); the calibration vector is in
/// (x, y[, z]) axis order, matching [`Interval`].
#[derive(Debug, Clone)]
pub struct CalibratedImage {
    data: ArrayD<f32>,
    calibration: Vec<f64>,
}

impl CalibratedImage {
    pub fn new(data: ArrayD<f32>, calibration: Vec<f64>) -> Result<Self, DetectError> {
        let ndim = data.ndim();
        if ndim < 2 || ndim > 3 {
            return Err(DetectError::InvalidImage(format!(
                "expected 2 or 3 spatial dimensions, got {}.",
                ndim
            )));
        }
        if data.shape().iter().any(|&extent| extent == 0) {
            return Err(DetectError::InvalidImage(
                "image has a zero-extent axis.".to_string(),
            ));
        }
        if calibration.len() != ndim {
            return Err(DetectError::InvalidImage(format!(
                "calibration has {} entries for a {}D image.",
                calibration.len(),
                ndim
            )));
        }
        if calibration.iter().any(|&c| c <= 0.0) {
            return Err(DetectError::InvalidImage(
                "calibration entries must be positive.".to_string(),
            ));
        }
        Ok(CalibratedImage { data, calibration })
    }

    pub fn num_dimensions(&self) -> usize {
        self.data.ndim()
    }

    pub fn is_3d(&self) -> bool {
        self.data.ndim() == 3
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Physical pixel size per axis, (x, y[, z]) order.
    pub fn calibration(&self) -> &[f64] {
        &self.calibration
    }

    /// The zero-origin interval spanning the whole image.
    pub fn full_interval(&self) -> Interval {
        let ndim = self.data.ndim();
        let extents: Vec<usize> = (0..ndim)
            .map(|d| self.data.shape()[ndim - 1 - d])
            .collect();
        // A constructed image always has non-zero extents.
        Interval::from_extents(&extents).unwrap_or_else(|_| unreachable!())
    }

    /// Crops to `interval` and re-expresses the result with a zero origin,
    /// carrying the calibration across the crop. The interval is in this
    /// image's own (zero-based) coordinates.
    pub fn crop(&self, interval: &Interval) -> Result<CalibratedImage, DetectError> {
        let ndim = self.data.ndim();
        if interval.num_dimensions() != ndim {
            return Err(DetectError::InvalidInterval(format!(
                "interval has {} axes but the image has {}.",
                interval.num_dimensions(),
                ndim
            )));
        }
        for d in 0..ndim {
            let size = self.data.shape()[ndim - 1 - d] as i64;
            if interval.min(d) < 0 || interval.max(d) >= size {
                return Err(DetectError::InvalidInterval(format!(
                    "axis {} range [{}, {}] exceeds image extent {}.",
                    d,
                    interval.min(d),
                    interval.max(d),
                    size
                )));
            }
        }
        let cropped = self
            .data
            .slice_each_axis(|ax| {
                let d = ndim - 1 - ax.axis.index();
                Slice::from(interval.min(d) as isize..=interval.max(d) as isize)
            })
            .to_owned();
        Ok(CalibratedImage {
            data: cropped,
            calibration: self.calibration.clone(),
        })
    }
}

/// The upstream image source: a calibrated, multi-channel, multi-frame stack.
///
/// Samples are stored as (t, c, [z,] y, x). The detection core never consumes
/// a stack directly; it works on one [`CalibratedImage`] slice at a time.
#[derive(Debug)]
pub struct ImageStack {
    data: ArrayD<f32>,
    calibration: Vec<f64>,
}

impl ImageStack {
    /// `data` axes must be (t, c, y, x) for 2D stacks or (t, c, z, y, x) for
    /// 3D ones; `calibration` is spatial only, (x, y[, z]) order.
    pub fn new(data: ArrayD<f32>, calibration: Vec<f64>) -> Result<Self, DetectError> {
        let ndim = data.ndim();
        if ndim < 4 || ndim > 5 {
            return Err(DetectError::InvalidImage(format!(
                "expected 4 (t, c, y, x) or 5 (t, c, z, y, x) axes, got {}.",
                ndim
            )));
        }
        if calibration.len() != ndim - 2 {
            return Err(DetectError::InvalidImage(format!(
                "calibration has {} entries for {} spatial dimensions.",
                calibration.len(),
                ndim - 2
            )));
        }
        Ok(ImageStack { data, calibration })
    }

    pub fn num_frames(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn num_channels(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn is_3d(&self) -> bool {
        self.data.ndim() == 5
    }

    pub fn calibration(&self) -> &[f64] {
        &self.calibration
    }

    /// Extracts the single-channel, single-frame spatial slice at
    /// (`channel`, `frame`); `channel` is zero-based here.
    pub fn slice(&self, channel: usize, frame: usize) -> Result<CalibratedImage, DetectError> {
        if frame >= self.num_frames() {
            return Err(DetectError::InvalidImage(format!(
                "frame {} out of range, the stack has {} frames.",
                frame,
                self.num_frames()
            )));
        }
        if channel >= self.num_channels() {
            return Err(DetectError::InvalidImage(format!(
                "channel {} out of range, the stack has {} channels.",
                channel,
                self.num_channels()
            )));
        }
        let spatial = self
            .data
            .index_axis(Axis(0), frame)
            .index_axis(Axis(0), channel)
            .to_owned();
        CalibratedImage::new(spatial, self.calibration.clone())
    }
}

use std::path::Path;

use ndarray::Array3;

use crate::errors::DetectError;
use crate::image_utils::calibrated::CalibratedImage;

/// Whether a classifier processes planar images or whole volumes.
///
/// The mode is fixed when a classifier is loaded and threaded through the
/// pipeline from there; it is never re-derived from image shapes downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingMode {
    TwoD,
    ThreeD,
}

impl ProcessingMode {
    /// The mode matching an image's spatial dimensionality.
    pub fn of(image: &CalibratedImage) -> ProcessingMode {
        if image.is_3d() {
            ProcessingMode::ThreeD
        } else {
            ProcessingMode::TwoD
        }
    }

    pub fn num_dimensions(&self) -> usize {
        match self {
            ProcessingMode::TwoD => 2,
            ProcessingMode::ThreeD => 3,
        }
    }
}

/// Raw output of one classifier application, before any channel selection.
///
/// In 2D mode the layout is `[class, y, x]`: one probability plane per class.
/// In 3D mode the backend emits a single fused stack `[num_classes * depth,
/// y, x]` whose depth axis interleaves the classes plane by plane: depth
/// `j * num_classes + c` holds plane `j` of class `c`. The pipeline is
/// responsible for de-interleaving.
#[derive(Debug, Clone)]
pub struct ClassProbabilities {
    data: Array3<f32>,
    num_classes: usize,
    mode: ProcessingMode,
}

impl ClassProbabilities {
    pub fn new(
        data: Array3<f32>,
        num_classes: usize,
        mode: ProcessingMode,
    ) -> Result<Self, DetectError> {
        if num_classes == 0 {
            return Err(DetectError::ComputationFailed(
                "classifier reported zero classes.".to_string(),
            ));
        }
        let leading = data.shape()[0];
        match mode {
            ProcessingMode::TwoD => {
                if leading != num_classes {
                    return Err(DetectError::ComputationFailed(format!(
                        "expected {} class channels, the backend produced {}.",
                        num_classes, leading
                    )));
                }
            }
            ProcessingMode::ThreeD => {
                if leading % num_classes != 0 {
                    return Err(DetectError::ComputationFailed(format!(
                        "interleaved depth {} is not a multiple of {} classes.",
                        leading, num_classes
                    )));
                }
            }
        }
        Ok(ClassProbabilities {
            data,
            num_classes,
            mode,
        })
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }
}

/// A loaded, pre-trained pixel classifier.
///
/// Implementations wrap whatever inference engine actually runs the model;
/// all engine-specific coupling stays behind this trait. Backends never
/// panic across the boundary; every failure comes back as a `DetectError`
/// with a readable message.
pub trait ClassifierBackend {
    /// Number of classes the classifier knows.
    fn num_classes(&self) -> usize;

    /// Class labels in the classifier's internal class-index order; index 0
    /// here is class index 0 everywhere else in the crate.
    fn class_names(&self) -> &[String];

    /// Runs classification over a zero-origin image, producing per-pixel
    /// probabilities in [0, 1] for every class at once. `num_threads` is a
    /// hint; backends that fix their thread count at load time may ignore it.
    fn apply(
        &self,
        image: &CalibratedImage,
        num_threads: usize,
    ) -> Result<ClassProbabilities, DetectError>;
}

/// Creates classifier backends from serialized model files.
///
/// A loader is cheap to keep around; the backends it produces are recreated
/// from scratch whenever the model path or processing mode changes, never
/// mutated in place.
pub trait ClassifierLoader {
    type Backend: ClassifierBackend;

    /// Loads a trained classifier from `path` in the given processing mode.
    /// Fails with `ClassifierLoadFailed` when the file is unreadable,
    /// malformed, or incompatible with the mode.
    fn load(&self, path: &Path, mode: ProcessingMode) -> Result<Self::Backend, DetectError>;
}

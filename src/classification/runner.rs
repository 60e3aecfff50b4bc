use std::thread;

use log::debug;
use ndarray::{Array3, Axis};

use crate::annotations::spot::Spot;
use crate::classification::backend::{ClassifierBackend, ProcessingMode};
use crate::detection::extract::spots_from_threshold;
use crate::errors::DetectError;
use crate::image_utils::calibrated::CalibratedImage;
use crate::image_utils::interval::Interval;
use crate::image_utils::volume::ProbabilityVolume;

/// The probability pipeline: crops, classifies, selects one class channel,
/// repairs the 3D interleaving, translates back to source coordinates, and
/// keeps the last computed volume for re-thresholding.
///
/// One runner owns one loaded backend; a caller wanting a different model
/// file or processing mode builds a new runner rather than mutating this
/// one. Instances are not internally synchronized, so callers serialize
/// access.
pub struct ClassifierRunner<B> {
    backend: B,
    mode: ProcessingMode,
    num_threads: usize,
    last_output: Option<ProbabilityVolume>,
    last_calibration: Option<Vec<f64>>,
}

impl<B: ClassifierBackend> ClassifierRunner<B> {
    pub fn new(backend: B, mode: ProcessingMode) -> Self {
        ClassifierRunner {
            backend,
            mode,
            num_threads: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            last_output: None,
            last_calibration: None,
        }
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = num_threads.max(1);
    }

    pub fn num_classes(&self) -> usize {
        self.backend.num_classes()
    }

    /// Class labels in internal class-index order.
    pub fn class_names(&self) -> &[String] {
        self.backend.class_names()
    }

    /// The volume cached by the last successful computation, if any.
    pub fn last_probabilities(&self) -> Option<&ProbabilityVolume> {
        self.last_output.as_ref()
    }

    /// Runs the classifier over `interval` of `input` and extracts the
    /// probability map for `class_index`, in the coordinate frame of
    /// `input`. On success the result replaces the cached volume; on failure
    /// the previously cached volume is left untouched.
    pub fn compute_probabilities(
        &mut self,
        input: &CalibratedImage,
        interval: &Interval,
        class_index: usize,
    ) -> Result<&ProbabilityVolume, DetectError> {
        let available = self.backend.num_classes();
        if class_index >= available {
            return Err(DetectError::ClassIndexOutOfRange {
                requested: class_index,
                available,
            });
        }
        if input.num_dimensions() != self.mode.num_dimensions() {
            return Err(DetectError::InvalidImage(format!(
                "a {}D image cannot be processed in {}D mode.",
                input.num_dimensions(),
                self.mode.num_dimensions()
            )));
        }

        let cropped = input.crop(interval)?;
        let probas = self.backend.apply(&cropped, self.num_threads)?;
        let selected = match self.mode {
            ProcessingMode::TwoD => probas
                .data()
                .index_axis(Axis(0), class_index)
                .to_owned()
                .into_dyn(),
            // In 3D the backend interleaves the classes along z, so picking
            // the class and un-doing the interleave are the same operation:
            // the class index is the starting depth.
            ProcessingMode::ThreeD => {
                deinterleave(probas.data(), class_index, probas.num_classes())?.into_dyn()
            }
        };

        let volume = ProbabilityVolume::new(selected, interval.clone())?;
        debug!(
            "computed probabilities for class {} over {:?} pixels",
            class_index,
            interval.extents()
        );
        self.last_calibration = Some(input.calibration().to_vec());
        Ok(&*self.last_output.insert(volume))
    }

    /// Re-thresholds the cached volume into spots without touching the
    /// classifier. Fails with `NotComputedYet` before the first successful
    /// [`compute_probabilities`](Self::compute_probabilities).
    pub fn spots_from_last_probabilities(
        &self,
        threshold: f64,
        simplify: bool,
    ) -> Result<Vec<Spot>, DetectError> {
        let volume = self.last_output.as_ref().ok_or(DetectError::NotComputedYet)?;
        let calibration = self
            .last_calibration
            .as_ref()
            .ok_or(DetectError::NotComputedYet)?;
        Ok(self.spots(volume, calibration, threshold, simplify))
    }

    /// Converts a probability volume into spots: foreground is strictly
    /// greater than `threshold`, one spot per connected region.
    pub fn spots(
        &self,
        volume: &ProbabilityVolume,
        calibration: &[f64],
        threshold: f64,
        simplify: bool,
    ) -> Vec<Spot> {
        spots_from_threshold(
            volume,
            calibration,
            threshold,
            simplify,
            self.mode,
            self.num_threads,
        )
    }
}

/// Reconstructs a contiguous volume from a class-interleaved stack by taking
/// depths `start, start + step, start + 2 * step, …` in ascending order.
pub(crate) fn deinterleave(
    fused: &Array3<f32>,
    start: usize,
    step: usize,
) -> Result<Array3<f32>, DetectError> {
    let nz = fused.shape()[0];
    let slices: Vec<_> = (start..nz)
        .step_by(step.max(1))
        .map(|z| fused.index_axis(Axis(0), z))
        .collect();
    if slices.is_empty() {
        return Err(DetectError::ComputationFailed(format!(
            "no slices for class offset {} in a stack of depth {}.",
            start, nz
        )));
    }
    ndarray::stack(Axis(0), &slices)
        .map_err(|err| DetectError::ComputationFailed(err.to_string()))
}

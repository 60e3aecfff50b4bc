use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use log::{debug, info};

use crate::annotations::spot::Spot;
use crate::classification::backend::{ClassifierLoader, ProcessingMode};
use crate::classification::runner::ClassifierRunner;
use crate::errors::DetectError;
use crate::image_utils::calibrated::ImageStack;
use crate::image_utils::interval::Interval;
use crate::image_utils::render::render_probabilities;
use crate::image_utils::volume::ProbabilityVolume;
use crate::settings::DetectorSettings;

/// Decides, per request, whether the classifier pipeline must be re-run or
/// whether re-thresholding the cached probability volume suffices.
///
/// The recompute key is (image identity, frame, classifier path, class
/// index, channel). Image identity is `Arc` pointer identity: a different
/// in-memory stack forces recomputation even if its content matches, which
/// is "the active image changed" semantics. Any key change discards the
/// loaded classifier and the cached volume and recomputes; a key match only
/// re-thresholds, so dragging a threshold slider never re-runs the
/// classifier.
///
/// Any failure while reloading or recomputing empties the cache completely,
/// so the next request starts from scratch instead of reusing half-built
/// state.
pub struct DetectionPreviewer<L: ClassifierLoader> {
    loader: L,
    runner: Option<ClassifierRunner<L::Backend>>,
    num_threads: Option<usize>,
    previous_image: Option<Arc<ImageStack>>,
    previous_frame: Option<usize>,
    previous_path: Option<PathBuf>,
    previous_class_index: Option<usize>,
    previous_channel: Option<usize>,
}

impl<L: ClassifierLoader> DetectionPreviewer<L> {
    pub fn new(loader: L) -> Self {
        DetectionPreviewer {
            loader,
            runner: None,
            num_threads: None,
            previous_image: None,
            previous_frame: None,
            previous_path: None,
            previous_class_index: None,
            previous_channel: None,
        }
    }

    /// Fixes the thread count handed to freshly built pipelines; by default
    /// each pipeline uses the available parallelism.
    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = Some(num_threads.max(1));
    }

    /// Runs detection for one frame, recomputing probabilities only when the
    /// recompute key changed since the previous call. `roi` restricts the
    /// computation to a region of the frame; it defaults to the whole frame
    /// and is deliberately not part of the recompute key.
    pub fn preview(
        &mut self,
        image: &Arc<ImageStack>,
        frame: usize,
        roi: Option<&Interval>,
        settings: &DetectorSettings,
    ) -> Result<Vec<Spot>, DetectError> {
        settings.validate()?;
        let path = settings.classifier_path()?.clone();
        File::open(&path).map_err(|err| DetectError::ClassifierLoadFailed {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        let channel = settings.target_channel - 1;
        let input = image.slice(channel, frame)?;
        let mode = ProcessingMode::of(&input);

        if self.needs_recompute(image, frame, &path, settings.class_index, channel) {
            info!("Recomputing probabilities.");
            let backend = match self.loader.load(&path, mode) {
                Ok(backend) => backend,
                Err(err) => {
                    self.reset();
                    return Err(err);
                }
            };
            let mut runner = ClassifierRunner::new(backend, mode);
            if let Some(num_threads) = self.num_threads {
                runner.set_num_threads(num_threads);
            }
            let interval = match roi {
                Some(interval) => interval.clone(),
                None => input.full_interval(),
            };
            if let Err(err) = runner.compute_probabilities(&input, &interval, settings.class_index)
            {
                self.reset();
                return Err(err);
            }
            self.runner = Some(runner);
            self.previous_image = Some(Arc::clone(image));
            self.previous_frame = Some(frame);
            self.previous_path = Some(path);
            self.previous_class_index = Some(settings.class_index);
            self.previous_channel = Some(channel);
        } else {
            debug!("Recompute key unchanged, reusing cached probabilities.");
        }

        info!("Creating spots from probabilities.");
        self.re_threshold(settings.proba_threshold, settings.simplify_contours)
    }

    /// Re-thresholds the cached probability volume without consulting the
    /// recompute key. Fails with `NotLoaded` before any successful preview.
    pub fn re_threshold(
        &mut self,
        threshold: f64,
        simplify: bool,
    ) -> Result<Vec<Spot>, DetectError> {
        let runner = self.runner.as_ref().ok_or(DetectError::NotLoaded)?;
        match runner.spots_from_last_probabilities(threshold, simplify) {
            Ok(spots) => Ok(spots),
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Class labels of the classifier at `path`, reloading only when the
    /// path differs from the one used last.
    pub fn class_names(
        &mut self,
        path: &Path,
        mode: ProcessingMode,
    ) -> Result<Vec<String>, DetectError> {
        if self.previous_path.as_deref() != Some(path) || self.runner.is_none() {
            info!("Discovering class names in classifier.");
            let backend = self.loader.load(path, mode)?;
            // A fresh runner has no cached volume; drop the rest of the key
            // so the next preview recomputes instead of trusting it.
            self.reset();
            self.runner = Some(ClassifierRunner::new(backend, mode));
            self.previous_path = Some(path.to_path_buf());
        }
        let runner = self.runner.as_ref().ok_or(DetectError::NotLoaded)?;
        let names = runner.class_names().to_vec();
        info!("Found {} classes in classifier.", names.len());
        Ok(names)
    }

    /// The cached probability volume from the last successful computation,
    /// for optional display.
    pub fn last_probabilities(&self) -> Option<&ProbabilityVolume> {
        self.runner.as_ref().and_then(|r| r.last_probabilities())
    }

    /// Renders the cached probability volume as a grayscale image.
    pub fn render_last_probabilities(&self) -> Option<GrayImage> {
        self.last_probabilities().map(render_probabilities)
    }

    fn needs_recompute(
        &self,
        image: &Arc<ImageStack>,
        frame: usize,
        path: &Path,
        class_index: usize,
        channel: usize,
    ) -> bool {
        if self.runner.is_none() {
            return true;
        }
        let same_image = self
            .previous_image
            .as_ref()
            .is_some_and(|previous| Arc::ptr_eq(previous, image));
        let same_frame = self.previous_frame == Some(frame);
        let same_path = self.previous_path.as_deref() == Some(path);
        let same_class = self.previous_class_index == Some(class_index);
        let same_channel = self.previous_channel == Some(channel);
        !(same_image && same_frame && same_path && same_class && same_channel)
    }

    fn reset(&mut self) {
        self.runner = None;
        self.previous_image = None;
        self.previous_frame = None;
        self.previous_path = None;
        self.previous_class_index = None;
        self.previous_channel = None;
    }
}

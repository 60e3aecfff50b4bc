use std::time::{Duration, Instant};

use crate::annotations::spot::Spot;
use crate::classification::backend::ClassifierBackend;
use crate::classification::runner::ClassifierRunner;
use crate::errors::DetectError;
use crate::image_utils::calibrated::CalibratedImage;
use crate::image_utils::interval::Interval;

/// One-shot detection over a single frame: computes probabilities for one
/// class and extracts spots, without any recompute caching. The batch
/// counterpart of [`DetectionPreviewer`](crate::preview::DetectionPreviewer).
pub struct SpotDetector<'a, B> {
    runner: &'a mut ClassifierRunner<B>,
    image: &'a CalibratedImage,
    interval: Interval,
    class_index: usize,
    threshold: f64,
    simplify: bool,
    spots: Vec<Spot>,
    processing_time: Option<Duration>,
}

impl<'a, B: ClassifierBackend> SpotDetector<'a, B> {
    pub fn new(
        runner: &'a mut ClassifierRunner<B>,
        image: &'a CalibratedImage,
        interval: Interval,
        class_index: usize,
        threshold: f64,
        simplify: bool,
    ) -> Self {
        SpotDetector {
            runner,
            image,
            interval,
            class_index,
            threshold,
            simplify,
            spots: Vec::new(),
            processing_time: None,
        }
    }

    /// Runs compute-then-extract. On success the detected spots are
    /// available through [`spots`](Self::spots).
    pub fn process(&mut self) -> Result<(), DetectError> {
        let start = Instant::now();
        self.runner
            .compute_probabilities(self.image, &self.interval, self.class_index)?;
        self.spots = self
            .runner
            .spots_from_last_probabilities(self.threshold, self.simplify)?;
        self.processing_time = Some(start.elapsed());
        Ok(())
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    /// Time taken by the last successful [`process`](Self::process) call.
    pub fn processing_time(&self) -> Option<Duration> {
        self.processing_time
    }
}

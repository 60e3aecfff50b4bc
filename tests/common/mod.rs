#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ndarray::Array3;
use probaspot::image_utils::calibrated::CalibratedImage;
use probaspot::{
    ClassProbabilities, ClassifierBackend, ClassifierLoader, DetectError, ProcessingMode,
};

pub type PatternFn =
    Arc<dyn Fn(&CalibratedImage, usize, ProcessingMode) -> Array3<f32> + Send + Sync>;

/// Scripted classifier backend for tests. Emits a fixed probability pattern
/// and counts how often it is applied, so tests can verify that cache hits
/// never reach the classifier.
pub struct StubBackend {
    num_classes: usize,
    names: Vec<String>,
    pattern: PatternFn,
    mode: ProcessingMode,
    apply_calls: Arc<AtomicUsize>,
}

impl ClassifierBackend for StubBackend {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn class_names(&self) -> &[String] {
        &self.names
    }

    fn apply(
        &self,
        image: &CalibratedImage,
        _num_threads: usize,
    ) -> Result<ClassProbabilities, DetectError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        let data = (self.pattern)(image, self.num_classes, self.mode);
        ClassProbabilities::new(data, self.num_classes, self.mode)
    }
}

/// Loader for [`StubBackend`]s with load/apply counters shared across every
/// backend it produces.
pub struct StubLoader {
    pub num_classes: usize,
    pub pattern: PatternFn,
    pub load_calls: Arc<AtomicUsize>,
    pub apply_calls: Arc<AtomicUsize>,
    pub fail_next_load: Arc<AtomicBool>,
}

impl StubLoader {
    pub fn new(num_classes: usize, pattern: PatternFn) -> Self {
        StubLoader {
            num_classes,
            pattern,
            load_calls: Arc::new(AtomicUsize::new(0)),
            apply_calls: Arc::new(AtomicUsize::new(0)),
            fail_next_load: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn load_count(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn apply_count(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }
}

impl ClassifierLoader for StubLoader {
    type Backend = StubBackend;

    fn load(&self, path: &Path, mode: ProcessingMode) -> Result<StubBackend, DetectError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(DetectError::ClassifierLoadFailed {
                path: path.to_path_buf(),
                reason: "scripted load failure".to_string(),
            });
        }
        Ok(StubBackend {
            num_classes: self.num_classes,
            names: (0..self.num_classes)
                .map(|i| format!("class {}", i + 1))
                .collect(),
            pattern: Arc::clone(&self.pattern),
            mode,
            apply_calls: Arc::clone(&self.apply_calls),
        })
    }
}

/// 2D pattern: class 0 has probability 1.0 in the 3x3 square with its
/// top-left corner at (3, 3); every other sample is 0.
pub fn centered_square_pattern() -> PatternFn {
    Arc::new(|image, num_classes, _mode| {
        let shape = image.data().shape();
        let (height, width) = (shape[0], shape[1]);
        let mut planes = Array3::zeros((num_classes, height, width));
        for y in 3..6.min(height) {
            for x in 3..6.min(width) {
                planes[[0, y, x]] = 1.0;
            }
        }
        planes
    })
}

/// 2D pattern: every class channel is entirely `value`.
pub fn uniform_pattern(value: f32) -> PatternFn {
    Arc::new(move |image, num_classes, _mode| {
        let shape = image.data().shape();
        Array3::from_elem((num_classes, shape[0], shape[1]), value)
    })
}

/// 3D pattern: a class-interleaved stack in which every plane of class `c`
/// is filled with `c / 10`, except that class 1 has probability 1.0 in the
/// single voxel at (x, y, z) = (1, 1, 1).
pub fn interleaved_voxel_pattern() -> PatternFn {
    Arc::new(|image, num_classes, _mode| {
        let shape = image.data().shape();
        let (depth, height, width) = (shape[0], shape[1], shape[2]);
        let mut fused = Array3::zeros((depth * num_classes, height, width));
        for j in 0..depth {
            for c in 0..num_classes {
                fused
                    .index_axis_mut(ndarray::Axis(0), j * num_classes + c)
                    .fill(c as f32 / 10.0);
            }
        }
        if num_classes > 1 && depth > 1 {
            fused[[1 * num_classes + 1, 1, 1]] = 1.0;
        }
        fused
    })
}

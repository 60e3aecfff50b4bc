use std::fs::File;
use std::path::{Path, PathBuf};
use std::thread;

use log::debug;
use ndarray::{Array3, Array4, Array5, Axis, Ix4, Ix5};
use ort::inputs;
use ort::session::Session;

use crate::classification::backend::{
    ClassProbabilities, ClassifierBackend, ClassifierLoader, ProcessingMode,
};
use crate::errors::DetectError;
use crate::image_utils::calibrated::CalibratedImage;

/// Side length of the zero-filled probe image pushed through a freshly
/// loaded model. The probe satisfies engine initialization and tells us the
/// class count; it has no semantic effect on later classifications.
const PROBE_EXTENT: usize = 16;
const PROBE_DEPTH: usize = 2;

/// A pixel classifier backed by an ONNX inference session.
///
/// The model takes a single-channel image tensor `(1, 1, [d,] h, w)` and
/// emits per-class probability planes `(1, classes, [d,] h, w)`. Note that
/// ort fixes its intra-op thread count when the session is built, so the
/// `num_threads` hint passed to [`ClassifierBackend::apply`] is ignored here;
/// configure it on the [`OnnxLoader`] instead.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    class_names: Vec<String>,
    num_classes: usize,
    mode: ProcessingMode,
    path: PathBuf,
}

impl OnnxClassifier {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    fn input_name(&self) -> Result<String, DetectError> {
        self.session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                DetectError::ComputationFailed("the model declares no inputs.".to_string())
            })
    }

    fn output_name(&self) -> Result<String, DetectError> {
        self.session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                DetectError::ComputationFailed("the model declares no outputs.".to_string())
            })
    }

    fn apply_2d(&self, image: &CalibratedImage) -> Result<ClassProbabilities, DetectError> {
        let shape = image.data().shape();
        let (height, width) = (shape[0], shape[1]);
        let mut input = Array4::<f32>::zeros((1, 1, height, width));
        input
            .index_axis_mut(Axis(0), 0)
            .index_axis_mut(Axis(0), 0)
            .assign(image.data());

        let name = self.input_name()?;
        let outputs = self
            .session
            .run(inputs![name.as_str() => input.view()]?)?;
        let output = outputs[self.output_name()?.as_str()].try_extract_tensor::<f32>()?;
        let output = output
            .into_dimensionality::<Ix4>()
            .map_err(|err| DetectError::ComputationFailed(err.to_string()))?;
        if output.shape()[1] != self.num_classes {
            return Err(DetectError::ComputationFailed(format!(
                "the model produced {} channels for {} classes.",
                output.shape()[1],
                self.num_classes
            )));
        }

        let planes: Array3<f32> = output
            .index_axis(Axis(0), 0)
            .mapv(|v| v.clamp(0.0, 1.0));
        ClassProbabilities::new(planes, self.num_classes, ProcessingMode::TwoD)
    }

    fn apply_3d(&self, image: &CalibratedImage) -> Result<ClassProbabilities, DetectError> {
        let shape = image.data().shape();
        let (depth, height, width) = (shape[0], shape[1], shape[2]);
        let mut input = Array5::<f32>::zeros((1, 1, depth, height, width));
        input
            .index_axis_mut(Axis(0), 0)
            .index_axis_mut(Axis(0), 0)
            .assign(image.data());

        let name = self.input_name()?;
        let outputs = self
            .session
            .run(inputs![name.as_str() => input.view()]?)?;
        let output = outputs[self.output_name()?.as_str()].try_extract_tensor::<f32>()?;
        let output = output
            .into_dimensionality::<Ix5>()
            .map_err(|err| DetectError::ComputationFailed(err.to_string()))?;
        if output.shape()[1] != self.num_classes || output.shape()[2] != depth {
            return Err(DetectError::ComputationFailed(format!(
                "the model produced shape {:?} for {} classes over depth {}.",
                output.shape(),
                self.num_classes,
                depth
            )));
        }

        // Fuse (class, z) into the interleaved stack layout of
        // `ClassProbabilities`: depth j * classes + c holds plane j of
        // class c.
        let per_class = output.index_axis(Axis(0), 0); // (classes, z, y, x)
        let interleaved = per_class.permuted_axes([1, 0, 2, 3]); // (z, classes, y, x)
        let fused = interleaved
            .as_standard_layout()
            .to_owned()
            .into_shape_with_order((depth * self.num_classes, height, width))
            .map_err(|err| DetectError::ComputationFailed(err.to_string()))?
            .mapv(|v| v.clamp(0.0, 1.0));
        ClassProbabilities::new(fused, self.num_classes, ProcessingMode::ThreeD)
    }
}

impl ClassifierBackend for OnnxClassifier {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn apply(
        &self,
        image: &CalibratedImage,
        _num_threads: usize,
    ) -> Result<ClassProbabilities, DetectError> {
        if image.num_dimensions() != self.mode.num_dimensions() {
            return Err(DetectError::ComputationFailed(format!(
                "a {}D image was passed to a classifier loaded in {}D mode.",
                image.num_dimensions(),
                self.mode.num_dimensions()
            )));
        }
        match self.mode {
            ProcessingMode::TwoD => self.apply_2d(image),
            ProcessingMode::ThreeD => self.apply_3d(image),
        }
    }
}

/// Loads [`OnnxClassifier`] backends from `.onnx` model files.
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    /// Intra-op thread count handed to ort when building sessions.
    pub intra_threads: usize,
}

impl Default for OnnxLoader {
    fn default() -> Self {
        OnnxLoader {
            intra_threads: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

impl ClassifierLoader for OnnxLoader {
    type Backend = OnnxClassifier;

    fn load(&self, path: &Path, mode: ProcessingMode) -> Result<OnnxClassifier, DetectError> {
        // Readability first, so a bad path gets a plain message instead of
        // whatever the inference engine reports.
        File::open(path).map_err(|err| DetectError::ClassifierLoadFailed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let session = Session::builder()
            .and_then(|builder| builder.with_intra_threads(self.intra_threads))
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|err| DetectError::ClassifierLoadFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let mut classifier = OnnxClassifier {
            session,
            class_names: Vec::new(),
            num_classes: 0,
            mode,
            path: path.to_path_buf(),
        };
        classifier.num_classes = probe_num_classes(&classifier, mode).map_err(|err| {
            DetectError::ClassifierLoadFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        classifier.class_names = read_class_names(&classifier.session, classifier.num_classes);
        debug!(
            "loaded classifier {:?} with {} classes",
            path, classifier.num_classes
        );
        Ok(classifier)
    }
}

/// Pushes a zero probe image through the model to check mode compatibility
/// and discover the class count from the output channel axis.
fn probe_num_classes(
    classifier: &OnnxClassifier,
    mode: ProcessingMode,
) -> Result<usize, DetectError> {
    let name = classifier.input_name()?;
    let outputs = match mode {
        ProcessingMode::TwoD => {
            let probe = Array4::<f32>::zeros((1, 1, PROBE_EXTENT, PROBE_EXTENT));
            classifier
                .session
                .run(inputs![name.as_str() => probe.view()]?)?
        }
        ProcessingMode::ThreeD => {
            let probe = Array5::<f32>::zeros((1, 1, PROBE_DEPTH, PROBE_EXTENT, PROBE_EXTENT));
            classifier
                .session
                .run(inputs![name.as_str() => probe.view()]?)?
        }
    };
    let output = outputs[classifier.output_name()?.as_str()].try_extract_tensor::<f32>()?;
    let expected_rank = mode.num_dimensions() + 2;
    if output.ndim() != expected_rank {
        return Err(DetectError::ComputationFailed(format!(
            "the model emits a rank-{} tensor, expected rank {} for {}D processing.",
            output.ndim(),
            expected_rank,
            mode.num_dimensions()
        )));
    }
    let num_classes = output.shape()[1];
    if num_classes == 0 {
        return Err(DetectError::ComputationFailed(
            "the model emits zero class channels.".to_string(),
        ));
    }
    Ok(num_classes)
}

/// Class labels from the model's custom metadata (a JSON list or index map
/// under the "names" key), falling back to "class N" labels.
fn read_class_names(session: &Session, num_classes: usize) -> Vec<String> {
    if let Ok(metadata) = session.metadata() {
        if let Ok(Some(raw)) = metadata.custom("names") {
            if let Some(names) = parse_class_names(&raw, num_classes) {
                return names;
            }
        }
    }
    (0..num_classes).map(|i| format!("class {}", i + 1)).collect()
}

fn parse_class_names(raw: &str, num_classes: usize) -> Option<Vec<String>> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        if list.len() == num_classes {
            return Some(list);
        }
    }
    if let Ok(map) = serde_json::from_str::<std::collections::BTreeMap<usize, String>>(raw) {
        if map.len() == num_classes && map.keys().copied().eq(0..num_classes) {
            return Some(map.into_values().collect());
        }
    }
    None
}

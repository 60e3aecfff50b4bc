//! Spot detection from pixel-classifier probability maps.
//!
//! This crate turns the per-pixel class probabilities of an external,
//! pre-trained pixel classifier into discrete spatial objects: point
//! detections with polygon contours in 2D or surface meshes in 3D. The
//! classifier is an opaque model file reached through the
//! [`ClassifierLoader`](classification::backend::ClassifierLoader) /
//! [`ClassifierBackend`](classification::backend::ClassifierBackend) seam;
//! an ONNX implementation is provided in [`classification::onnx`].
//!
//! The typical interactive flow goes through
//! [`DetectionPreviewer`](preview::DetectionPreviewer), which caches the
//! last computed probability volume so that changing only the decision
//! threshold never re-runs the classifier. Batch processing uses
//! [`SpotDetector`](detector::SpotDetector) directly.

pub mod annotations;
pub mod classification;
pub mod detection;
pub mod detector;
pub mod errors;
pub mod image_utils;
pub mod preview;
pub mod settings;

pub use annotations::point::Point;
pub use annotations::spot::{Spot, SpotShape};
pub use classification::backend::{
    ClassProbabilities, ClassifierBackend, ClassifierLoader, ProcessingMode,
};
pub use classification::onnx::{OnnxClassifier, OnnxLoader};
pub use classification::runner::ClassifierRunner;
pub use detector::SpotDetector;
pub use errors::DetectError;
pub use image_utils::calibrated::{CalibratedImage, ImageStack};
pub use image_utils::interval::Interval;
pub use image_utils::volume::ProbabilityVolume;
pub use preview::DetectionPreviewer;
pub use settings::DetectorSettings;

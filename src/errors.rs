use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the detection core.
///
/// Every public operation in this crate returns one of these instead of
/// panicking; the messages are full sentences suitable for surfacing to a
/// user as-is.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("The path to the classifier file is not set.")]
    ClassifierPathNotSet,

    #[error("Problem with classifier file {}: {reason}", path.display())]
    ClassifierLoadFailed { path: PathBuf, reason: String },

    #[error("The classifier is not loaded.")]
    NotLoaded,

    #[error("Requested class index {requested}, but the classifier only knows {available} classes.")]
    ClassIndexOutOfRange { requested: usize, available: usize },

    #[error("Probabilities have not been computed yet.")]
    NotComputedYet,

    #[error("Classification failed: {0}")]
    ComputationFailed(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid detector settings: {0}")]
    InvalidSettings(String),
}

impl From<ort::Error> for DetectError {
    fn from(err: ort::Error) -> Self {
        DetectError::ComputationFailed(err.to_string())
    }
}

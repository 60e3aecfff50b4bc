use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::DetectError;

pub const DEFAULT_PROBA_THRESHOLD: f64 = 0.5;
pub const DEFAULT_CLASS_INDEX: usize = 0;
pub const DEFAULT_TARGET_CHANNEL: usize = 1;

/// Configuration for one detection run, as supplied by an external settings
/// collaborator.
///
/// `target_channel` is 1-based, following the convention of the imaging
/// tools this core plugs into; it is converted to a 0-based index
/// internally. `class_index` is 0-based.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DetectorSettings {
    pub target_channel: usize,
    pub classifier_path: Option<PathBuf>,
    pub class_index: usize,
    pub proba_threshold: f64,
    pub simplify_contours: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        DetectorSettings {
            target_channel: DEFAULT_TARGET_CHANNEL,
            classifier_path: None,
            class_index: DEFAULT_CLASS_INDEX,
            proba_threshold: DEFAULT_PROBA_THRESHOLD,
            simplify_contours: true,
        }
    }
}

impl DetectorSettings {
    /// Checks ranges before a run. A missing classifier path gets its own
    /// error so callers can distinguish "not set" from "unreadable".
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.target_channel < 1 {
            return Err(DetectError::InvalidSettings(format!(
                "target channel must be 1 or larger, got {}.",
                self.target_channel
            )));
        }
        if !(0.0..=1.0).contains(&self.proba_threshold) {
            return Err(DetectError::InvalidSettings(format!(
                "probability threshold must be within [0, 1], got {}.",
                self.proba_threshold
            )));
        }
        if self.classifier_path.is_none() {
            return Err(DetectError::ClassifierPathNotSet);
        }
        Ok(())
    }

    /// The classifier path, failing like [`validate`](Self::validate) when
    /// unset.
    pub fn classifier_path(&self) -> Result<&PathBuf, DetectError> {
        self.classifier_path
            .as_ref()
            .ok_or(DetectError::ClassifierPathNotSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> DetectorSettings {
        DetectorSettings {
            classifier_path: Some(PathBuf::from("/tmp/classifier.onnx")),
            ..DetectorSettings::default()
        }
    }

    #[test]
    fn defaults_are_valid_except_for_the_path() {
        let err = DetectorSettings::default().validate().unwrap_err();
        assert!(matches!(err, DetectError::ClassifierPathNotSet));
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut settings = valid_settings();
        settings.proba_threshold = 1.5;
        assert!(settings.validate().is_err());
        settings.proba_threshold = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_channel() {
        let mut settings = valid_settings();
        settings.target_channel = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = valid_settings();
        let json = serde_json::to_string(&settings).unwrap();
        let back: DetectorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}

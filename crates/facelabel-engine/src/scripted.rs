//! Detection replayed from a JSON script.
//!
//! The script is an array of frames. Each frame is either an array of face
//! records or `{"error": "..."}` to simulate a failed detection call:
//!
//! ```json
//! [
//!   [{"region": {"x": 10, "y": 20, "width": 80, "height": 80}, "age": 30.2}],
//!   [],
//!   {"error": "model timeout"}
//! ]
//! ```

use crate::engine::{DetectorError, FaceDetector};
use facelabel_core::FaceRecord;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read detection script {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid detection script: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedFrame {
    Faces(Vec<FaceRecord>),
    Failure { error: String },
}

/// Replays scripted frames in order, optionally wrapping around.
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    frames: Vec<ScriptedFrame>,
    cursor: usize,
    looping: bool,
}

impl ScriptedDetector {
    pub fn new(frames: Vec<ScriptedFrame>, looping: bool) -> Self {
        Self {
            frames,
            cursor: 0,
            looping,
        }
    }

    pub fn from_json(json: &str, looping: bool) -> Result<Self, ScriptError> {
        let frames: Vec<ScriptedFrame> = serde_json::from_str(json)?;
        Ok(Self::new(frames, looping))
    }

    pub fn load(path: &Path, looping: bool) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let detector = Self::from_json(&json, looping)?;
        tracing::info!(
            path = %path.display(),
            frames = detector.len(),
            looping,
            "loaded detection script"
        );
        Ok(detector)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self) -> Result<Vec<FaceRecord>, DetectorError> {
        if self.frames.is_empty() {
            return Err(DetectorError::Exhausted);
        }
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return Err(DetectorError::Exhausted);
            }
            self.cursor = 0;
        }
        let frame = &self.frames[self.cursor];
        self.cursor += 1;
        match frame {
            ScriptedFrame::Faces(records) => Ok(records.clone()),
            ScriptedFrame::Failure { error } => Err(DetectorError::Failed(error.clone())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"[
        [{
            "region": {"x": 10, "y": 20, "width": 80, "height": 90},
            "gender": "male",
            "gender_probability": 0.9
        }],
        [],
        {"error": "model timeout"}
    ]"#;

    #[test]
    fn test_parse_script() {
        let detector = ScriptedDetector::from_json(SCRIPT, false).unwrap();
        assert_eq!(detector.len(), 3);
        assert!(matches!(detector.frames[1], ScriptedFrame::Faces(ref f) if f.is_empty()));
        assert_eq!(
            detector.frames[2],
            ScriptedFrame::Failure {
                error: "model timeout".into()
            }
        );
    }

    #[test]
    fn test_replays_then_exhausts() {
        let mut detector = ScriptedDetector::from_json(SCRIPT, false).unwrap();
        let first = detector.detect().unwrap();
        assert_eq!(first[0].gender.as_deref(), Some("male"));
        assert!(detector.detect().unwrap().is_empty());
        assert!(matches!(
            detector.detect(),
            Err(DetectorError::Failed(ref m)) if m == "model timeout"
        ));
        assert!(matches!(detector.detect(), Err(DetectorError::Exhausted)));
        assert!(matches!(detector.detect(), Err(DetectorError::Exhausted)));
    }

    #[test]
    fn test_looping_wraps_around() {
        let mut detector = ScriptedDetector::from_json(SCRIPT, true).unwrap();
        for _ in 0..3 {
            let _ = detector.detect();
        }
        assert_eq!(detector.detect().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_script_is_exhausted_even_when_looping() {
        let mut detector = ScriptedDetector::from_json("[]", true).unwrap();
        assert!(detector.is_empty());
        assert!(matches!(detector.detect(), Err(DetectorError::Exhausted)));
    }

    #[test]
    fn test_bundled_demo_script_parses() {
        let demo = include_str!("../../../demos/faces.json");
        let mut detector = ScriptedDetector::from_json(demo, false).unwrap();
        assert_eq!(detector.len(), 5);
        assert_eq!(detector.detect().unwrap().len(), 1);
        let second = detector.detect().unwrap();
        assert_eq!(second[1].landmarks.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn test_invalid_script() {
        assert!(matches!(
            ScriptedDetector::from_json(r#"{"frames": 1}"#, false),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ScriptedDetector::load(Path::new("/nonexistent/facelabel.json"), false)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Io { .. }));
    }
}

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_encoder::{DetectedFace, FaceEncoder};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read detections: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid detection record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One line of a detections file.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    frame: usize,
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

/// Replays pre-computed detection results by frame index.
///
/// Lets the registry run against faces that an external detector already
/// encoded, e.g. a JSON-lines dump produced by a separate capture process.
pub struct ReplayFaceEncoder {
    cache: Arc<HashMap<usize, Vec<DetectedFace>>>,
}

impl ReplayFaceEncoder {
    pub fn new(cache: Arc<HashMap<usize, Vec<DetectedFace>>>) -> Self {
        Self { cache }
    }

    /// Parses JSON lines of the form
    /// `{"frame": 0, "faces": [{"region": {...}, "encoding": [...]}]}`.
    ///
    /// Blank lines are skipped; repeated frame indices accumulate faces.
    pub fn from_json_lines(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut cache: HashMap<usize, Vec<DetectedFace>> = HashMap::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: DetectionRecord =
                serde_json::from_str(&line).map_err(|e| ReplayError::Parse {
                    line: idx + 1,
                    source: e,
                })?;
            cache.entry(record.frame).or_default().extend(record.faces);
        }
        Ok(Self::new(Arc::new(cache)))
    }

    /// Frame indices with recorded detections, ascending.
    pub fn frame_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.cache.keys().copied().collect();
        indices.sort_unstable();
        indices
    }
}

impl FaceEncoder for ReplayFaceEncoder {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(self.cache.get(&frame.index()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::encoding::Encoding;
    use crate::shared::region::FaceRegion;
    use std::io::Cursor;

    fn face(left: i32, x: f64) -> DetectedFace {
        DetectedFace {
            region: FaceRegion::new(20, left + 50, 70, left),
            encoding: Encoding::new(vec![x, 0.0]),
        }
    }

    #[test]
    fn test_returns_cached_faces_for_known_frame() {
        let faces = vec![face(10, 0.1), face(60, 0.9)];
        let cache = Arc::new(HashMap::from([(0, faces.clone())]));
        let mut encoder = ReplayFaceEncoder::new(cache);

        assert_eq!(encoder.detect(&Frame::empty(0)).unwrap(), faces);
    }

    #[test]
    fn test_returns_empty_for_unknown_frame() {
        let cache = Arc::new(HashMap::from([(0, vec![face(10, 0.1)])]));
        let mut encoder = ReplayFaceEncoder::new(cache);

        assert!(encoder.detect(&Frame::empty(5)).unwrap().is_empty());
    }

    #[test]
    fn test_parses_json_lines() {
        let input = r#"{"frame": 0, "faces": [{"region": {"top": 20, "right": 60, "bottom": 70, "left": 10}, "encoding": [0.1, 0.0]}]}

{"frame": 2, "faces": []}
{"frame": 1}
{"frame": 0, "faces": [{"region": {"top": 20, "right": 110, "bottom": 70, "left": 60}, "encoding": [0.9, 0.0]}]}
"#;
        let mut encoder = ReplayFaceEncoder::from_json_lines(Cursor::new(input)).unwrap();

        assert_eq!(encoder.frame_indices(), vec![0, 1, 2]);
        assert_eq!(
            encoder.detect(&Frame::empty(0)).unwrap(),
            vec![face(10, 0.1), face(60, 0.9)]
        );
        assert!(encoder.detect(&Frame::empty(1)).unwrap().is_empty());
    }

    #[test]
    fn test_reports_line_of_malformed_record() {
        let input = "{\"frame\": 0}\n{\"frame\": \"x\"}\n";
        match ReplayFaceEncoder::from_json_lines(Cursor::new(input)) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other.err()),
        }
    }
}

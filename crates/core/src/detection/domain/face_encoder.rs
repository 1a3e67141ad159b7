use serde::{Deserialize, Serialize};

use crate::shared::encoding::Encoding;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// One face found in a frame together with its descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub region: FaceRegion,
    pub encoding: Encoding,
}

/// Domain interface for the external detector.
///
/// Returns faces in detection order; an empty result is a frame without
/// faces, not an error. Implementations may be stateful, hence `&mut self`.
pub trait FaceEncoder: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}

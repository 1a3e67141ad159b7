use serde::{Deserialize, Serialize};

/// Face bounding box in pixel coordinates, as reported by the detector.
///
/// Edges follow the `(top, right, bottom, left)` convention. The registry
/// never inspects the geometry; it is carried through to the annotator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceRegion {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

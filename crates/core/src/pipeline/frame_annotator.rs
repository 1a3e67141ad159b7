use serde::Serialize;

use crate::registry::domain::registry_state::IdentityId;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// A resolved face, ready to be drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaceAnnotation {
    pub region: FaceRegion,
    pub id: IdentityId,
    pub display_name: String,
    /// First sighting of this identity; collaborators store a thumbnail then.
    pub is_new: bool,
}

/// Port for whatever renders results: a window, a video writer, a log.
///
/// Receives every resolved face of a frame at once, in detection order.
pub trait FrameAnnotator: Send {
    fn annotate(
        &mut self,
        frame: &Frame,
        faces: &[FaceAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Discards annotations. Useful when only the registry side effects matter.
pub struct NullFrameAnnotator;

impl FrameAnnotator for NullFrameAnnotator {
    fn annotate(
        &mut self,
        _frame: &Frame,
        _faces: &[FaceAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

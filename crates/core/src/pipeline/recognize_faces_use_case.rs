use crate::detection::domain::face_encoder::FaceEncoder;
use crate::pipeline::frame_annotator::{FaceAnnotation, FrameAnnotator};
use crate::registry::infrastructure::shared_identity_registry::SharedIdentityRegistry;
use crate::shared::frame::Frame;

/// Running counters for a recognition session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecognitionSummary {
    pub frames: usize,
    pub frames_failed: usize,
    pub faces: usize,
    pub matched: usize,
    pub registered: usize,
    /// Faces the registry rejected; they were left unannotated.
    pub skipped: usize,
}

/// Per-frame recognition pipeline: detect → resolve each face → annotate.
///
/// A face the registry cannot resolve (bad descriptor, failed save) is
/// logged and left out of the frame's annotations; the remaining faces and
/// frames are still processed.
pub struct RecognizeFacesUseCase {
    detector: Box<dyn FaceEncoder>,
    registry: SharedIdentityRegistry,
    annotator: Box<dyn FrameAnnotator>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    summary: RecognitionSummary,
}

impl RecognizeFacesUseCase {
    pub fn new(
        detector: Box<dyn FaceEncoder>,
        registry: SharedIdentityRegistry,
        annotator: Box<dyn FrameAnnotator>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            detector,
            registry,
            annotator,
            on_progress,
            summary: RecognitionSummary::default(),
        }
    }

    /// Recognizes the faces of one frame and hands them to the annotator.
    pub fn execute(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceAnnotation>, Box<dyn std::error::Error>> {
        self.summary.frames += 1;
        let detected = match self.detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                self.summary.frames_failed += 1;
                return Err(e);
            }
        };

        let mut annotations = Vec::with_capacity(detected.len());
        for face in detected {
            self.summary.faces += 1;
            match self.registry.resolve(&face.encoding) {
                Ok(resolution) => {
                    if resolution.is_new {
                        self.summary.registered += 1;
                    } else {
                        self.summary.matched += 1;
                    }
                    annotations.push(FaceAnnotation {
                        region: face.region,
                        id: resolution.id,
                        display_name: resolution.display_name,
                        is_new: resolution.is_new,
                    });
                }
                Err(e) => {
                    self.summary.skipped += 1;
                    log::warn!("Skipping face in frame {}: {e}", frame.index());
                }
            }
        }

        if let Err(e) = self.annotator.annotate(frame, &annotations) {
            self.summary.frames_failed += 1;
            return Err(e);
        }
        Ok(annotations)
    }

    /// Processes `frames` in order. A frame that fails is logged and skipped.
    ///
    /// Returns an error only when the progress callback asks to stop.
    pub fn run(
        &mut self,
        frames: impl IntoIterator<Item = Frame>,
        total_frames: usize,
    ) -> Result<RecognitionSummary, Box<dyn std::error::Error>> {
        for (n, frame) in frames.into_iter().enumerate() {
            if let Err(e) = self.execute(&frame) {
                log::warn!("Skipping frame {}: {e}", frame.index());
            }
            self.report_progress(n + 1, total_frames)?;
        }
        Ok(self.summary.clone())
    }

    pub fn summary(&self) -> &RecognitionSummary {
        &self.summary
    }

    fn report_progress(
        &self,
        current: usize,
        total: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref callback) = self.on_progress {
            if !callback(current, total) {
                return Err("Cancelled".into());
            }
        }
        Ok(())
    }
}

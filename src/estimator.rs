//! Seams to the pose model and the camera, both owned by the host.

use anyhow::Result;

use crate::pose::Pose;

/// A captured video frame.
pub type Frame = image::DynamicImage;

/// Keypoint model. Loaded once by the host and shared across sessions.
///
/// Called from a blocking worker, so implementations may run inference inline.
/// `Ok(None)` means nobody was found in the frame.
pub trait PoseEstimator: Send + Sync {
    fn estimate_pose(&self, frame: &Frame) -> Result<Option<Pose>>;
}

impl<F> PoseEstimator for F
where
    F: Fn(&Frame) -> Result<Option<Pose>> + Send + Sync,
{
    fn estimate_pose(&self, frame: &Frame) -> Result<Option<Pose>> {
        self(frame)
    }
}

/// Supplies the most recent camera frame. `Ok(None)` when no frame is ready.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

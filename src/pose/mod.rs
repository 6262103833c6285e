pub mod geometry;
pub mod keypoint;

pub use geometry::angle_at;
pub use keypoint::{Keypoint, KeypointName, Pose};

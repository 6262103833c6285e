//! Real-time exercise form analysis.
//!
//! A host feeds per-frame body keypoints (or a camera plus a pose model) into a
//! recording session; the session raises coaching cues as faults appear and
//! produces a scored report when recording stops.

pub mod analysis;
pub mod estimator;
pub mod exercise;
pub mod pose;
pub mod replay;
pub mod report;
pub mod session;
pub mod settings;
pub mod utils;

pub use analysis::{Issue, IssueCategory};
pub use estimator::{Frame, FrameSource, PoseEstimator};
pub use exercise::Exercise;
pub use pose::{Keypoint, KeypointName, Pose};
pub use report::{Report, Verdict};
pub use session::{FormSession, SessionController, SessionEvent, SessionSnapshot, SessionStatus};
pub use settings::{AnalysisSettings, SettingsStore};

use serde::{Deserialize, Serialize};

/// Landmark vocabulary emitted by single-person pose models (COCO / MoveNet order).
///
/// Form rules only read the twelve body joints; the face landmarks are kept so a
/// full 17-point estimator output deserializes without filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// A single landmark in frame-pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f32,
    pub y: f32,
    /// Detection confidence in [0, 1]. Pose models report this as `score`.
    #[serde(alias = "score")]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name,
            x,
            y,
            confidence,
        }
    }

    pub fn distance_to(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// All keypoints detected for one subject in one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Returns the keypoint only when its confidence reaches `min_confidence`.
    pub fn confident(&self, name: KeypointName, min_confidence: f32) -> Option<&Keypoint> {
        self.get(name).filter(|kp| kp.confidence >= min_confidence)
    }

    /// Mean confidence over every keypoint present, 0 for an empty pose.
    pub fn mean_confidence(&self) -> f32 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        let total: f32 = self.keypoints.iter().map(|kp| kp.confidence).sum();
        total / self.keypoints.len() as f32
    }
}

impl From<Vec<Keypoint>> for Pose {
    fn from(keypoints: Vec<Keypoint>) -> Self {
        Self::new(keypoints)
    }
}

//! Movement gate: skips rule evaluation while the subject is static.

use crate::pose::{KeypointName, Pose};

/// Landmarks that move during every supported exercise.
pub const CORE_LANDMARKS: [KeypointName; 6] = [
    KeypointName::LeftHip,
    KeypointName::RightHip,
    KeypointName::LeftKnee,
    KeypointName::RightKnee,
    KeypointName::LeftShoulder,
    KeypointName::RightShoulder,
];

/// Landmarks must exceed this confidence in both samples to count.
pub const MOVEMENT_MIN_CONFIDENCE: f32 = 0.3;

/// Summed displacement (pixels) above which the subject is exercising.
pub const MOVEMENT_THRESHOLD: f32 = 5.0;

/// Total pixel displacement of the core landmarks between two samples.
///
/// A landmark missing or below confidence in either sample contributes zero.
/// Without a previous sample there is nothing to compare, so the result is 0.
pub fn movement_magnitude(previous: Option<&Pose>, current: &Pose) -> f32 {
    let Some(previous) = previous else {
        return 0.0;
    };

    CORE_LANDMARKS
        .iter()
        .filter_map(|&name| {
            let prev = previous.get(name)?;
            let curr = current.get(name)?;
            if prev.confidence > MOVEMENT_MIN_CONFIDENCE && curr.confidence > MOVEMENT_MIN_CONFIDENCE {
                Some(curr.distance_to(prev))
            } else {
                None
            }
        })
        .sum()
}

pub fn is_moving(magnitude: f32) -> bool {
    magnitude > MOVEMENT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    fn core_pose(offset_x: f32, confidence: f32) -> Pose {
        Pose::new(
            CORE_LANDMARKS
                .iter()
                .enumerate()
                .map(|(i, &name)| Keypoint::new(name, 100.0 + offset_x, 50.0 * i as f32, confidence))
                .collect(),
        )
    }

    #[test]
    fn test_no_previous_pose() {
        assert_eq!(movement_magnitude(None, &core_pose(0.0, 0.9)), 0.0);
    }

    #[test]
    fn test_sums_core_displacement() {
        let prev = core_pose(0.0, 0.9);
        let curr = core_pose(2.0, 0.9);
        let magnitude = movement_magnitude(Some(&prev), &curr);
        assert!((magnitude - 12.0).abs() < 1e-4);
        assert!(is_moving(magnitude));
    }

    #[test]
    fn test_low_confidence_contributes_nothing() {
        let prev = core_pose(0.0, 0.9);
        let curr = core_pose(50.0, 0.3);
        assert_eq!(movement_magnitude(Some(&prev), &curr), 0.0);
    }

    #[test]
    fn test_small_displacement_is_static() {
        // Only the left hip moves, by 3px
        let prev = core_pose(0.0, 0.9);
        let mut keypoints = prev.keypoints().to_vec();
        keypoints[0].x += 3.0;
        let curr = Pose::new(keypoints);

        let magnitude = movement_magnitude(Some(&prev), &curr);
        assert!((magnitude - 3.0).abs() < 1e-4);
        assert!(!is_moving(magnitude));
        assert!(!is_moving(MOVEMENT_THRESHOLD));
    }
}

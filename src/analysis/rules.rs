//! Per-exercise geometric form rules.
//!
//! Each rule reads a handful of landmarks and is skipped silently when any of
//! them is missing or below [`RULE_MIN_CONFIDENCE`]. Coordinates are frame
//! pixels with y growing downwards. Single-sided rules use the left side.

use crate::exercise::Exercise;
use crate::pose::{angle_at, Keypoint, KeypointName, Pose};

use super::issue::{Issue, IssueCategory};

/// Landmarks below this confidence are ignored by every rule.
pub const RULE_MIN_CONFIDENCE: f32 = 0.5;

/// Knee-to-ankle horizontal offset, as a fraction of hip-to-knee offset.
const VALGUS_RATIO: f32 = 0.6;
/// Knee angle band (degrees) that counts as a partial squat.
const SQUAT_SHALLOW_MIN: f32 = 110.0;
const SQUAT_SHALLOW_MAX: f32 = 160.0;
/// Hip angle (degrees) below which the torso has folded too far.
const SQUAT_LEAN_MAX: f32 = 45.0;

const PUSHUP_ALIGNMENT_PX: f32 = 60.0;
const PUSHUP_SHALLOW_MIN: f32 = 140.0;
const PUSHUP_SHALLOW_MAX: f32 = 170.0;

const PLANK_DEVIATION_PX: f32 = 30.0;
const PLANK_DIRECTION_PX: f32 = 20.0;

const DEADLIFT_BACK_MIN: f32 = 140.0;
const DEADLIFT_HIP_SHOULDER_MIN_PX: f32 = 50.0;

/// Evaluate every rule for `exercise` against one pose.
pub fn evaluate(pose: &Pose, exercise: Exercise, elapsed_secs: u64) -> Vec<Issue> {
    let mut faults = Vec::new();

    match exercise {
        Exercise::Squat => squat_rules(pose, &mut faults),
        Exercise::Pushup => pushup_rules(pose, &mut faults),
        Exercise::Plank => plank_rules(pose, &mut faults),
        Exercise::Deadlift => deadlift_rules(pose, &mut faults),
        // No automated checks for the bench press yet; it is still scored.
        Exercise::BenchPress => {}
    }

    faults
        .into_iter()
        .map(|category| Issue::new(category, elapsed_secs))
        .collect()
}

fn joints<const N: usize>(pose: &Pose, names: [KeypointName; N]) -> Option<[&Keypoint; N]> {
    let found = names
        .iter()
        .map(|&name| pose.confident(name, RULE_MIN_CONFIDENCE))
        .collect::<Option<Vec<&Keypoint>>>()?;
    found.try_into().ok()
}

fn squat_rules(pose: &Pose, faults: &mut Vec<IssueCategory>) {
    use KeypointName::*;

    let sides = [
        (LeftHip, LeftKnee, LeftAnkle, IssueCategory::LeftKneeValgus),
        (RightHip, RightKnee, RightAnkle, IssueCategory::RightKneeValgus),
    ];
    for (hip, knee, ankle, category) in sides {
        if let Some([hip, knee, ankle]) = joints(pose, [hip, knee, ankle]) {
            let knee_ankle = (knee.x - ankle.x).abs();
            let hip_knee = (hip.x - knee.x).abs();
            if knee_ankle > hip_knee * VALGUS_RATIO {
                faults.push(category);
            }
        }
    }

    if let Some([hip, knee, ankle]) = joints(pose, [LeftHip, LeftKnee, LeftAnkle]) {
        let knee_angle = angle_at(hip, knee, ankle);
        if knee_angle > SQUAT_SHALLOW_MIN && knee_angle < SQUAT_SHALLOW_MAX {
            faults.push(IssueCategory::SquatDepth);
        }
    }

    if let Some([knee, hip, shoulder]) = joints(pose, [LeftKnee, LeftHip, LeftShoulder]) {
        if angle_at(knee, hip, shoulder) < SQUAT_LEAN_MAX {
            faults.push(IssueCategory::SquatForwardLean);
        }
    }
}

fn pushup_rules(pose: &Pose, faults: &mut Vec<IssueCategory>) {
    use KeypointName::*;

    if let Some([shoulder, hip, ankle]) = joints(pose, [LeftShoulder, LeftHip, LeftAnkle]) {
        let shoulder_hip = (shoulder.y - hip.y).abs();
        let hip_ankle = (hip.y - ankle.y).abs();
        if shoulder_hip > PUSHUP_ALIGNMENT_PX {
            faults.push(IssueCategory::PushupHipsSagging);
        } else if hip_ankle > PUSHUP_ALIGNMENT_PX {
            faults.push(IssueCategory::PushupHipsPiking);
        }
    }

    if let Some([shoulder, elbow, wrist]) = joints(pose, [LeftShoulder, LeftElbow, LeftWrist]) {
        let elbow_angle = angle_at(shoulder, elbow, wrist);
        if elbow_angle > PUSHUP_SHALLOW_MIN && elbow_angle < PUSHUP_SHALLOW_MAX {
            faults.push(IssueCategory::PushupDepth);
        }
    }
}

fn plank_rules(pose: &Pose, faults: &mut Vec<IssueCategory>) {
    use KeypointName::*;

    let Some([shoulder, hip, ankle]) = joints(pose, [LeftShoulder, LeftHip, LeftAnkle]) else {
        return;
    };

    let expected_hip_y = (shoulder.y + ankle.y) / 2.0;
    if (hip.y - expected_hip_y).abs() <= PLANK_DEVIATION_PX {
        return;
    }

    if hip.y > expected_hip_y + PLANK_DIRECTION_PX {
        faults.push(IssueCategory::PlankHipsSagging);
    } else if hip.y < expected_hip_y - PLANK_DIRECTION_PX {
        faults.push(IssueCategory::PlankHipsHigh);
    }
}

fn deadlift_rules(pose: &Pose, faults: &mut Vec<IssueCategory>) {
    use KeypointName::*;

    if let Some([knee, hip, shoulder]) = joints(pose, [LeftKnee, LeftHip, LeftShoulder]) {
        if angle_at(knee, hip, shoulder) < DEADLIFT_BACK_MIN {
            faults.push(IssueCategory::DeadliftBackRounding);
        }
    }

    if let Some([hip, shoulder]) = joints(pose, [LeftHip, LeftShoulder]) {
        if (hip.y - shoulder.y).abs() < DEADLIFT_HIP_SHOULDER_MIN_PX {
            faults.push(IssueCategory::DeadliftHipsRising);
        }
    }
}

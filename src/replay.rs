//! Offline replay of recorded pose streams through a [`FormSession`].

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::analysis::Issue;
use crate::exercise::Exercise;
use crate::pose::Pose;
use crate::report::Report;
use crate::session::FormSession;

/// One analysis tick of a recording. An empty pose is a tick where nobody was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Seconds since recording started.
    pub t: f64,
    #[serde(default)]
    pub keypoints: Pose,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    #[serde(default)]
    pub exercise: Option<Exercise>,
    /// Total recording length; defaults to the last frame's timestamp.
    #[serde(default)]
    pub duration_secs: Option<f64>,
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse recording {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Issues in the order they would have been announced live.
    pub live_issues: Vec<Issue>,
    pub report: Report,
}

pub fn replay(recording: &Recording, exercise: Exercise) -> Result<ReplayOutcome> {
    let mut session = FormSession::new();
    session.start(exercise, Utc::now())?;

    let mut live_issues = Vec::new();
    let mut last_t = 0.0_f64;
    for (index, frame) in recording.frames.iter().enumerate() {
        if !frame.t.is_finite() || frame.t < last_t {
            bail!("frame {index}: timestamp {} is out of order", frame.t);
        }
        last_t = frame.t;

        let pose = (!frame.keypoints.is_empty()).then(|| frame.keypoints.clone());
        live_issues.extend(session.analyze_frame(pose, frame.t.floor() as u64));
    }

    let duration_secs = recording.duration_secs.unwrap_or(last_t).max(last_t);
    let report = session
        .stop(duration_secs.floor() as u64)
        .ok_or_else(|| anyhow!("replay session was not recording"))?;

    Ok(ReplayOutcome {
        live_issues,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IssueCategory;
    use crate::pose::{Keypoint, KeypointName};

    fn plank_frame(t: f64, hip_y: f32) -> RecordedFrame {
        use KeypointName::*;
        RecordedFrame {
            t,
            keypoints: Pose::new(vec![
                Keypoint::new(LeftShoulder, 100.0, 200.0, 0.9),
                Keypoint::new(LeftHip, 250.0, hip_y, 0.9),
                Keypoint::new(LeftAnkle, 400.0, 200.0, 0.9),
            ]),
        }
    }

    #[test]
    fn test_plank_replay() {
        let recording = Recording {
            exercise: Some(Exercise::Plank),
            duration_secs: Some(12.0),
            frames: vec![
                plank_frame(0.0, 200.0),
                plank_frame(1.5, 245.0),
                plank_frame(2.0, 200.0),
                plank_frame(2.5, 245.0),
                plank_frame(5.0, 200.0),
                plank_frame(5.5, 245.0),
            ],
        };

        let outcome = replay(&recording, Exercise::Plank).unwrap();
        let stamps: Vec<u64> = outcome.live_issues.iter().map(|i| i.timestamp_secs).collect();
        assert_eq!(stamps, vec![1, 5]);

        let report = outcome.report;
        assert_eq!(report.categories, vec![IssueCategory::PlankHipsSagging]);
        assert_eq!(report.score, 91);
        assert_eq!(report.duration_secs, 12);
        assert_eq!(report.feedback[0], "📊 Hold duration: 12 seconds");
        assert_eq!(report.stats.frames_seen, 6);
    }

    #[test]
    fn test_parse_recording() {
        let json = r#"{
            "exercise": "bench-press",
            "frames": [
                { "t": 0 },
                { "t": 0.5, "keypoints": [{ "name": "left_hip", "x": 1, "y": 2, "score": 0.9 }] }
            ]
        }"#;
        let recording = Recording::from_json(json).unwrap();
        assert_eq!(recording.exercise, Some(Exercise::BenchPress));
        assert!(recording.duration_secs.is_none());
        assert!(recording.frames[0].keypoints.is_empty());
        assert_eq!(
            recording.frames[1].keypoints.get(KeypointName::LeftHip).map(|kp| kp.confidence),
            Some(0.9)
        );

        assert!(Recording::from_json(r#"{ "frames": [{ "keypoints": [] }] }"#).is_err());
    }

    #[test]
    fn test_nobody_in_frame() {
        let recording = Recording {
            frames: vec![
                RecordedFrame { t: 0.0, keypoints: Pose::default() },
                RecordedFrame { t: 4.0, keypoints: Pose::default() },
            ],
            ..Recording::default()
        };

        let outcome = replay(&recording, Exercise::Squat).unwrap();
        assert!(outcome.live_issues.is_empty());
        assert_eq!(outcome.report.score, 0);
        assert_eq!(outcome.report.duration_secs, 4);
    }

    #[test]
    fn test_out_of_order_timestamps() {
        let recording = Recording {
            frames: vec![plank_frame(3.0, 200.0), plank_frame(1.0, 245.0)],
            ..Recording::default()
        };
        assert!(replay(&recording, Exercise::Plank).is_err());

        let missing = Path::new("/nonexistent/formcheck-recording.json");
        assert!(Recording::load(missing).is_err());
    }
}

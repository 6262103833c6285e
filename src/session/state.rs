use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{is_moving, movement_magnitude, rules, Issue, IssueDeduplicator};
use crate::exercise::Exercise;
use crate::pose::Pose;
use crate::report::{generate_report, Report, ReportContext};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Mean keypoint confidence above which the subject counts as in frame.
pub const PRESENCE_MIN_CONFIDENCE: f32 = 0.4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Recording,
    Finalizing,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

/// Frame counters for one recording.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub frames_seen: u64,
    /// Frames where the subject was in frame with enough confidence.
    pub frames_present: u64,
    /// Present frames skipped by the movement gate (including the first one).
    pub frames_static: u64,
    pub frames_analyzed: u64,
}

/// One recording: lifecycle, per-frame analysis, and report generation.
///
/// Time is supplied by the caller as whole seconds since recording started,
/// which keeps this type free of clocks.
#[derive(Debug, Clone, Default)]
pub struct FormSession {
    status: SessionStatus,
    exercise: Exercise,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    duration_secs: u64,
    previous_pose: Option<Pose>,
    issues: Vec<Issue>,
    dedup: IssueDeduplicator,
    pose_detected: bool,
    stats: SessionStats,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn exercise(&self) -> Exercise {
        self.exercise
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Issues admitted so far, in the order they were raised.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn pose_detected(&self) -> bool {
        self.pose_detected
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn start(&mut self, exercise: Exercise, started_at: DateTime<Utc>) -> Result<&str> {
        if self.status != SessionStatus::Idle {
            bail!("a recording session is already active");
        }

        *self = Self {
            status: SessionStatus::Recording,
            exercise,
            session_id: Some(Uuid::new_v4().to_string()),
            started_at: Some(started_at),
            ..Self::default()
        };

        let session_id = self.session_id.as_deref().unwrap_or_default();
        log_info!("recording started: session {} ({})", session_id, exercise);
        Ok(session_id)
    }

    /// Feed one analysis tick. `None` means the estimator found nobody.
    ///
    /// Returns the issues newly admitted on this tick.
    pub fn analyze_frame(&mut self, pose: Option<Pose>, elapsed_secs: u64) -> Vec<Issue> {
        if self.status != SessionStatus::Recording {
            return Vec::new();
        }
        self.stats.frames_seen += 1;

        let Some(pose) = pose else {
            return Vec::new();
        };
        if pose.mean_confidence() <= PRESENCE_MIN_CONFIDENCE {
            return Vec::new();
        }
        self.pose_detected = true;
        self.stats.frames_present += 1;

        let magnitude = movement_magnitude(self.previous_pose.as_ref(), &pose);
        let should_analyze = self.previous_pose.is_some() && is_moving(magnitude);
        let admitted = if should_analyze {
            self.stats.frames_analyzed += 1;
            let raised = rules::evaluate(&pose, self.exercise, elapsed_secs);
            self.dedup.filter(raised)
        } else {
            self.stats.frames_static += 1;
            log_debug!("static frame at {}s (movement {:.1}px)", elapsed_secs, magnitude);
            Vec::new()
        };

        self.previous_pose = Some(pose);
        self.issues.extend(admitted.iter().cloned());
        admitted
    }

    /// Stop recording and freeze the duration. Returns false when not recording.
    pub fn freeze(&mut self, elapsed_secs: u64) -> bool {
        if self.status != SessionStatus::Recording {
            return false;
        }
        self.duration_secs = elapsed_secs;
        self.status = SessionStatus::Finalizing;
        true
    }

    /// Build the report and return to idle, discarding the session state.
    pub fn finalize(&mut self) -> Option<Report> {
        if self.status != SessionStatus::Finalizing {
            return None;
        }

        let session_id = self.session_id.clone().unwrap_or_default();
        let report = generate_report(ReportContext {
            session_id: &session_id,
            exercise: self.exercise,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            duration_secs: self.duration_secs,
            pose_detected: self.pose_detected,
            issues: &self.issues,
            stats: self.stats,
        });

        log_info!(
            "session {} finalized: score {} with {} unique issues over {}s",
            session_id,
            report.score,
            report.issue_count,
            report.duration_secs
        );

        *self = Self::default();
        Some(report)
    }

    /// Freeze and finalize in one step. Idle sessions yield `None`.
    pub fn stop(&mut self, elapsed_secs: u64) -> Option<Report> {
        self.freeze(elapsed_secs);
        self.finalize()
    }

    /// Abandon the recording without producing a report.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

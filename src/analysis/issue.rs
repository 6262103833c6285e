use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key for a form fault. Deduplication and scoring work on this key,
/// never on the message text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    LeftKneeValgus,
    RightKneeValgus,
    SquatDepth,
    SquatForwardLean,
    PushupHipsSagging,
    PushupHipsPiking,
    PushupDepth,
    PlankHipsSagging,
    PlankHipsHigh,
    DeadliftBackRounding,
    DeadliftHipsRising,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::LeftKneeValgus => "left-knee-valgus",
            IssueCategory::RightKneeValgus => "right-knee-valgus",
            IssueCategory::SquatDepth => "squat-depth",
            IssueCategory::SquatForwardLean => "squat-forward-lean",
            IssueCategory::PushupHipsSagging => "pushup-hips-sagging",
            IssueCategory::PushupHipsPiking => "pushup-hips-piking",
            IssueCategory::PushupDepth => "pushup-depth",
            IssueCategory::PlankHipsSagging => "plank-hips-sagging",
            IssueCategory::PlankHipsHigh => "plank-hips-high",
            IssueCategory::DeadliftBackRounding => "deadlift-back-rounding",
            IssueCategory::DeadliftHipsRising => "deadlift-hips-rising",
        }
    }

    /// Cue shown to the athlete when this fault is raised.
    pub fn cue(&self) -> &'static str {
        match self {
            IssueCategory::LeftKneeValgus => "Left knee tracking inward - push knees out",
            IssueCategory::RightKneeValgus => "Right knee tracking inward - push knees out",
            IssueCategory::SquatDepth => "Squat depth too shallow - go lower for parallel",
            IssueCategory::SquatForwardLean => "Excessive forward lean - keep chest up",
            IssueCategory::PushupHipsSagging => "Hips sagging - tighten your core",
            IssueCategory::PushupHipsPiking => "Hips piking up - lower them",
            IssueCategory::PushupDepth => "Not going deep enough - lower chest",
            IssueCategory::PlankHipsSagging => "Hips sagging - engage core and squeeze glutes",
            IssueCategory::PlankHipsHigh => "Hips too high - lower to form straight line",
            IssueCategory::DeadliftBackRounding => "Lower back rounding - keep neutral spine",
            IssueCategory::DeadliftHipsRising => "Hips rising too fast - maintain back angle",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form warning raised at a session-relative second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub category: IssueCategory,
    pub message: String,
    pub timestamp_secs: u64,
}

impl Issue {
    pub fn new(category: IssueCategory, timestamp_secs: u64) -> Self {
        Self {
            category,
            message: format!("⚠️ [{}s] {}", timestamp_secs, category.cue()),
            timestamp_secs,
        }
    }
}

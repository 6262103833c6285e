use serde::{Deserialize, Serialize};

/// Best score an automated check can award; perfect form is never certified.
pub const BASE_SCORE: u8 = 95;
/// Lowest score for a session where the subject was seen.
pub const SCORE_FLOOR: u8 = 60;
const DEDUCTION_PER_ISSUE: usize = 4;
const MAX_DEDUCTION: usize = 30;

/// Score from the number of unique fault categories in a session.
pub fn compute_score(unique_issues: usize) -> u8 {
    let deduction = unique_issues
        .saturating_mul(DEDUCTION_PER_ISSUE)
        .min(MAX_DEDUCTION) as u8;
    BASE_SCORE.saturating_sub(deduction).max(SCORE_FLOOR)
}

/// Grade announced with the final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Excellent,
    Good,
    NeedsWork,
    NoBodyDetected,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            Verdict::Excellent
        } else if score >= 70 {
            Verdict::Good
        } else {
            Verdict::NeedsWork
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent work!",
            Verdict::Good => "Good form with room for improvement",
            Verdict::NeedsWork => "Focus on the corrections provided",
            Verdict::NoBodyDetected => {
                "No body was detected during recording. Please ensure you are fully visible in the frame and try again."
            }
        }
    }
}

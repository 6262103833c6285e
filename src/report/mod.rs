pub mod feedback;
pub mod scoring;

pub use scoring::{compute_score, Verdict};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::analysis::{Issue, IssueCategory};
use crate::exercise::Exercise;
use crate::session::SessionStats;

/// Final score and feedback for one recording, handed to the host for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub exercise: Exercise,
    pub exercise_name: String,
    pub started_at: DateTime<Utc>,
    pub score: u8,
    pub verdict: Verdict,
    pub feedback: Vec<String>,
    pub duration_secs: u64,
    /// Unique fault categories raised during the session.
    pub issue_count: usize,
    pub categories: Vec<IssueCategory>,
    pub stats: SessionStats,
}

impl Report {
    /// Spoken summary announced once the analysis is ready.
    pub fn summary(&self) -> String {
        match self.verdict {
            Verdict::NoBodyDetected => self.verdict.message().to_string(),
            verdict => format!(
                "Analysis complete. Your form score is {} out of 100. {}",
                self.score,
                verdict.message()
            ),
        }
    }
}

/// Everything a finished session contributes to its report.
pub struct ReportContext<'a> {
    pub session_id: &'a str,
    pub exercise: Exercise,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub pose_detected: bool,
    pub issues: &'a [Issue],
    pub stats: SessionStats,
}

pub fn generate_report(ctx: ReportContext<'_>) -> Report {
    if !ctx.pose_detected {
        return Report {
            session_id: ctx.session_id.to_string(),
            exercise: ctx.exercise,
            exercise_name: ctx.exercise.display_name(),
            started_at: ctx.started_at,
            score: 0,
            verdict: Verdict::NoBodyDetected,
            feedback: feedback::NO_BODY_FEEDBACK.iter().map(|line| line.to_string()).collect(),
            duration_secs: ctx.duration_secs,
            issue_count: 0,
            categories: Vec::new(),
            stats: ctx.stats,
        };
    }

    let unique = first_occurrences(ctx.issues);
    let score = compute_score(unique.len());

    let mut lines = vec![feedback::duration_line(ctx.exercise, ctx.duration_secs)];
    lines.extend(feedback::issue_lines(&unique));
    lines.extend(feedback::tip_lines(ctx.exercise, !unique.is_empty()));

    Report {
        session_id: ctx.session_id.to_string(),
        exercise: ctx.exercise,
        exercise_name: ctx.exercise.display_name(),
        started_at: ctx.started_at,
        score,
        verdict: Verdict::from_score(score),
        feedback: lines,
        duration_secs: ctx.duration_secs,
        issue_count: unique.len(),
        categories: unique.iter().map(|issue| issue.category).collect(),
        stats: ctx.stats,
    }
}

/// First issue of each category, in the order the categories were first raised.
fn first_occurrences(issues: &[Issue]) -> Vec<&Issue> {
    let mut seen = HashSet::new();
    issues
        .iter()
        .filter(|issue| seen.insert(issue.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(issues: &[Issue], pose_detected: bool, duration_secs: u64) -> ReportContext<'_> {
        ReportContext {
            session_id: "test-session",
            exercise: Exercise::Squat,
            started_at: Utc::now(),
            duration_secs,
            pose_detected,
            issues,
            stats: SessionStats::default(),
        }
    }

    #[test]
    fn test_clean_session() {
        let report = generate_report(context(&[], true, 12));
        assert_eq!(report.score, 95);
        assert_eq!(report.verdict, Verdict::Excellent);
        assert_eq!(report.feedback[0], "📊 Estimated reps: 4");
        assert!(report.feedback.contains(&"✅ No major form issues detected!".to_string()));
        assert_eq!(report.feedback.len(), 5);
        assert_eq!(report.exercise_name, "SQUAT");
    }

    #[test]
    fn test_repeated_category_counts_once() {
        let issues = vec![
            Issue::new(IssueCategory::SquatDepth, 1),
            Issue::new(IssueCategory::LeftKneeValgus, 2),
            Issue::new(IssueCategory::SquatDepth, 4),
            Issue::new(IssueCategory::SquatDepth, 7),
        ];
        let report = generate_report(context(&issues, true, 9));

        assert_eq!(report.issue_count, 2);
        assert_eq!(report.score, 87);
        assert_eq!(report.categories, vec![IssueCategory::SquatDepth, IssueCategory::LeftKneeValgus]);
        assert_eq!(report.feedback[1], "⚠️ Form issues detected: 2");
        assert_eq!(report.feedback[2], issues[0].message);
        assert_eq!(report.feedback[3], issues[1].message);
        assert_eq!(report.feedback[4], "💡 Next session: Focus on depth and knee tracking");
        assert_eq!(report.feedback.len(), 5);
    }

    #[test]
    fn test_no_body_detected() {
        let issues = vec![Issue::new(IssueCategory::SquatDepth, 1)];
        let report = generate_report(context(&issues, false, 8));

        assert_eq!(report.score, 0);
        assert_eq!(report.verdict, Verdict::NoBodyDetected);
        assert_eq!(report.duration_secs, 8);
        assert_eq!(report.feedback, feedback::NO_BODY_FEEDBACK.map(String::from).to_vec());
        assert!(report.summary().starts_with("No body was detected"));
    }

    #[test]
    fn test_summary_and_serialization() {
        let report = generate_report(context(&[], true, 2));
        assert_eq!(
            report.summary(),
            "Analysis complete. Your form score is 95 out of 100. Excellent work!"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["durationSecs"], 2);
        assert_eq!(json["exercise"], "squat");
        assert_eq!(json["verdict"], "excellent");
    }
}

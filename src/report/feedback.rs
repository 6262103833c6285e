//! Feedback text for the end-of-session report.

use crate::analysis::Issue;
use crate::exercise::Exercise;

/// Below this many seconds there is too little footage to judge.
pub const MIN_ANALYZABLE_SECS: u64 = 3;

const GREAT_JOB_TIPS: &[(Exercise, [&str; 2])] = &[
    (
        Exercise::Squat,
        [
            "💡 Excellent! Keep this form and gradually increase weight",
            "💡 Remember to brace your core before each rep",
        ],
    ),
    (
        Exercise::Deadlift,
        [
            "💡 Great form! Focus on bar speed consistency",
            "💡 Keep pulling the slack out before each lift",
        ],
    ),
    (
        Exercise::BenchPress,
        [
            "💡 Solid technique! Maintain shoulder retraction",
            "💡 Drive through your feet for more power",
        ],
    ),
    (
        Exercise::Pushup,
        [
            "💡 Perfect form! Try elevating feet for more challenge",
            "💡 Control both the descent and ascent phases",
        ],
    ),
    (
        Exercise::Plank,
        [
            "💡 Strong hold! Try increasing duration gradually",
            "💡 Focus on maintaining this alignment under fatigue",
        ],
    ),
];

const NEXT_SESSION_TIPS: &[(Exercise, &str)] = &[
    (Exercise::Squat, "💡 Next session: Focus on depth and knee tracking"),
    (Exercise::Deadlift, "💡 Next session: Work on maintaining neutral spine"),
    (Exercise::BenchPress, "💡 Next session: Practice shoulder blade retraction"),
    (Exercise::Pushup, "💡 Next session: Film from side for better depth check"),
    (Exercise::Plank, "💡 Next session: Use a mirror to check alignment"),
];

pub const NO_BODY_FEEDBACK: [&str; 4] = [
    "❌ No body detected during recording",
    "⚠️ Make sure you are in frame and well-lit",
    "💡 Step back from camera so full body is visible",
    "💡 Try recording again with better positioning",
];

/// Rep estimate, hold duration, or a too-short warning.
pub fn duration_line(exercise: Exercise, duration_secs: u64) -> String {
    if duration_secs < MIN_ANALYZABLE_SECS {
        return "⏱️ Recording too short - record at least 3-5 reps for accurate analysis".to_string();
    }

    match exercise.rep_cycle_secs() {
        Some(cycle) => format!("📊 Estimated reps: {}", duration_secs / cycle),
        None => format!("📊 Hold duration: {} seconds", duration_secs),
    }
}

/// Summary of the unique issues, each listed with its first message.
pub fn issue_lines(unique_issues: &[&Issue]) -> Vec<String> {
    if unique_issues.is_empty() {
        return vec![
            "✅ No major form issues detected!".to_string(),
            "✓ Good form maintained throughout the movement".to_string(),
        ];
    }

    let mut lines = Vec::with_capacity(unique_issues.len() + 1);
    lines.push(format!("⚠️ Form issues detected: {}", unique_issues.len()));
    lines.extend(unique_issues.iter().map(|issue| issue.message.clone()));
    lines
}

/// Closing tips. Exercises without an entry reuse the squat tips.
pub fn tip_lines(exercise: Exercise, had_issues: bool) -> Vec<String> {
    tips_from(GREAT_JOB_TIPS, NEXT_SESSION_TIPS, exercise, had_issues)
}

fn tips_from(
    great_job: &[(Exercise, [&str; 2])],
    next_session: &[(Exercise, &str)],
    exercise: Exercise,
    had_issues: bool,
) -> Vec<String> {
    if had_issues {
        return lookup_or_squat(next_session, exercise)
            .map(|tip| vec![tip.to_string()])
            .unwrap_or_default();
    }

    lookup_or_squat(great_job, exercise)
        .map(|tips| tips.iter().map(|tip| tip.to_string()).collect())
        .unwrap_or_default()
}

fn lookup_or_squat<T: Copy>(table: &[(Exercise, T)], exercise: Exercise) -> Option<T> {
    lookup(table, exercise).or_else(|| lookup(table, Exercise::Squat))
}

fn lookup<T: Copy>(table: &[(Exercise, T)], exercise: Exercise) -> Option<T> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == exercise)
        .map(|(_, value)| *value)
}

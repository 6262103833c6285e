use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Movements the form analyzer can score. Chosen once per session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    Squat,
    Deadlift,
    BenchPress,
    Pushup,
    Plank,
}

impl Default for Exercise {
    fn default() -> Self {
        Exercise::Squat
    }
}

impl Exercise {
    pub const ALL: [Exercise; 5] = [
        Exercise::Squat,
        Exercise::Deadlift,
        Exercise::BenchPress,
        Exercise::Pushup,
        Exercise::Plank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::Squat => "squat",
            Exercise::Deadlift => "deadlift",
            Exercise::BenchPress => "bench-press",
            Exercise::Pushup => "pushup",
            Exercise::Plank => "plank",
        }
    }

    /// Report heading, e.g. "BENCH PRESS".
    pub fn display_name(&self) -> String {
        self.as_str().replace('-', " ").to_uppercase()
    }

    /// Seconds assumed per repetition when estimating rep counts.
    /// `None` for holds, which report duration instead.
    pub fn rep_cycle_secs(&self) -> Option<u64> {
        match self {
            Exercise::Plank => None,
            Exercise::Deadlift => Some(4),
            Exercise::Squat | Exercise::BenchPress | Exercise::Pushup => Some(3),
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exercise {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Exercise::ALL
            .into_iter()
            .find(|exercise| exercise.as_str() == normalized)
            .ok_or_else(|| anyhow!("unknown exercise '{s}'"))
    }
}

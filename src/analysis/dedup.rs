use std::collections::HashMap;

use super::issue::{Issue, IssueCategory};

/// Seconds before the same fault may be raised again.
pub const ISSUE_COOLDOWN_SECS: u64 = 2;

/// Suppresses repeats of a fault category inside the cooldown window.
#[derive(Debug, Clone)]
pub struct IssueDeduplicator {
    cooldown_secs: u64,
    last_emitted: HashMap<IssueCategory, u64>,
}

impl IssueDeduplicator {
    pub fn new() -> Self {
        Self::with_cooldown(ISSUE_COOLDOWN_SECS)
    }

    pub fn with_cooldown(cooldown_secs: u64) -> Self {
        Self {
            cooldown_secs,
            last_emitted: HashMap::new(),
        }
    }

    /// Admit the issue if its category is new or its cooldown has elapsed.
    /// Admission restarts the category's cooldown.
    pub fn admit(&mut self, issue: &Issue) -> bool {
        let now = issue.timestamp_secs;
        let admitted = match self.last_emitted.get(&issue.category) {
            Some(&last) => now.saturating_sub(last) >= self.cooldown_secs,
            None => true,
        };

        if admitted {
            self.last_emitted.insert(issue.category, now);
        }
        admitted
    }

    pub fn filter(&mut self, issues: Vec<Issue>) -> Vec<Issue> {
        issues.into_iter().filter(|issue| self.admit(issue)).collect()
    }
}

impl Default for IssueDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

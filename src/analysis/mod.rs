pub mod dedup;
pub mod issue;
pub mod movement;
pub mod rules;

pub use dedup::{IssueDeduplicator, ISSUE_COOLDOWN_SECS};
pub use issue::{Issue, IssueCategory};
pub use movement::{is_moving, movement_magnitude, MOVEMENT_THRESHOLD};
pub use rules::evaluate;

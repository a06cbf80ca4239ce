//! Goals with a D-Day: countdowns and schedule pacing.

mod countdown;
mod pacer;
mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use countdown::{compute_remaining, Remaining};
pub use pacer::{calendar_day_diff, pace, total_duration_days, PaceStatus, Pacing};
pub use service::{GoalService, GoalView, NewGoal};

/// A deadline the user is working toward.
///
/// Goals are never deleted here; dismissal flips `is_active` to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGoal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub target: DateTime<Utc>,
    pub is_active: bool,
    /// Self-reported, 0..=100.
    pub current_progress_percent: u8,
}

//! Collaborator contracts consumed by the core.
//!
//! Persistence, identity and notification delivery live outside the core;
//! hosts bind these traits to SQLite, HTTP or in-process adapters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::checkin::{CheckinRecord, NewCheckin};
use crate::error::Result;
use crate::events::Event;
use crate::goal::SessionGoal;
use crate::progress::WeeklyStats;
use crate::timer::Phase;

/// Identity and pairing lookup for the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    #[serde(default)]
    pub couple_id: Option<String>,
    #[serde(default)]
    pub partner_id: Option<String>,
}

impl UserContext {
    pub fn solo(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            couple_id: None,
            partner_id: None,
        }
    }

    pub fn paired(user_id: impl Into<String>, partner_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            couple_id: None,
            partner_id: Some(partner_id.into()),
        }
    }
}

/// One finished pomodoro phase, as written to the stats store.
///
/// `date` is the user's calendar day at completion. Weekly windows are
/// matched against it, never against the UTC date of `completed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub user_id: String,
    pub phase: Phase,
    pub duration_minutes: u32,
    pub completed_at: DateTime<Utc>,
    pub date: NaiveDate,
}

/// Source of truth for check-ins, completed phases and weekly aggregates.
pub trait StatsStore {
    /// Aggregates for the 7-day window ending on `week_ending`.
    /// `Ok(None)` means the user has no data at all.
    fn read_weekly_stats(&self, user_id: &str, week_ending: NaiveDate) -> Result<Option<WeeklyStats>>;

    /// Upsert keyed by `(user_id, date)`. Repeating the write returns the
    /// record that already exists instead of creating a second one.
    fn write_checkin(&self, checkin: &NewCheckin) -> Result<CheckinRecord>;

    /// Every distinct check-in date for the user, any order.
    fn checkin_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>>;

    fn write_session_completion(&self, completion: &SessionCompletion) -> Result<()>;

    /// Weekly study target for the user, falling back to the store default.
    fn weekly_goal(&self, user_id: &str) -> Result<u32>;
}

/// CRUD over goals, always scoped by owner.
pub trait GoalStore {
    fn create_goal(&self, goal: &SessionGoal) -> Result<()>;

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SessionGoal>>;

    fn list_goals(&self, user_id: &str, active_only: bool) -> Result<Vec<SessionGoal>>;

    /// Fails with `NotFound` when the goal doesn't exist for this user.
    fn update_goal_progress(&self, user_id: &str, goal_id: &str, percent: u8) -> Result<()>;

    /// Fails with `NotFound` when the goal doesn't exist for this user.
    fn set_goal_active(&self, user_id: &str, goal_id: &str, active: bool) -> Result<()>;
}

/// Fire-and-forget phase completion hook.
pub trait NotificationSink {
    fn on_phase_complete(&self, event: &Event);
}

/// Sink that only records completions in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn on_phase_complete(&self, event: &Event) {
        if let Some((phase, minutes)) = event.completed_phase() {
            tracing::info!(phase = phase.as_str(), minutes, "phase complete");
        }
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotificationSink;

impl NotificationSink for NoopNotificationSink {
    fn on_phase_complete(&self, _event: &Event) {}
}

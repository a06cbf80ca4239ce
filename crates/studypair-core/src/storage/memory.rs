//! In-process store for tests and embedding hosts that persist elsewhere.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use super::{week_start, DEFAULT_WEEKLY_GOAL_MINUTES};
use crate::checkin::{CheckinRecord, NewCheckin};
use crate::error::{CoreError, Result};
use crate::goal::SessionGoal;
use crate::ports::{GoalStore, SessionCompletion, StatsStore};
use crate::progress::WeeklyStats;
use crate::timer::Phase;

/// Single-threaded store backed by plain collections.
///
/// Mirrors the SQLite adapter's semantics: check-ins are keyed by
/// `(user_id, date)` and the first write wins. Fault switches let tests
/// exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    checkins: RefCell<BTreeMap<(String, NaiveDate), CheckinRecord>>,
    completions: RefCell<Vec<SessionCompletion>>,
    goals: RefCell<Vec<SessionGoal>>,
    weekly_goals: RefCell<HashMap<String, u32>>,
    pinned_stats: RefCell<HashMap<String, WeeklyStats>>,
    unavailable: RefCell<HashSet<String>>,
    fail_writes: Cell<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a retryable `Store` error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make reads for `user_id` fail, as if their shard were down.
    pub fn set_unavailable(&self, user_id: &str, unavailable: bool) {
        let mut set = self.unavailable.borrow_mut();
        if unavailable {
            set.insert(user_id.to_string());
        } else {
            set.remove(user_id);
        }
    }

    /// Report fixed stats for `user_id` instead of deriving them.
    pub fn pin_weekly_stats(&self, user_id: &str, stats: WeeklyStats) {
        self.pinned_stats
            .borrow_mut()
            .insert(user_id.to_string(), stats);
    }

    pub fn set_weekly_goal(&self, user_id: &str, minutes: u32) {
        self.weekly_goals
            .borrow_mut()
            .insert(user_id.to_string(), minutes);
    }

    /// Completed phases for one user, oldest first.
    pub fn session_completions(&self, user_id: &str) -> Vec<(Phase, u32)> {
        self.completions
            .borrow()
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| (c.phase, c.duration_minutes))
            .collect()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.get() {
            return Err(CoreError::Store("write rejected: store unavailable".into()));
        }
        Ok(())
    }

    fn with_goal<T>(&self, user_id: &str, goal_id: &str, f: impl FnOnce(&mut SessionGoal) -> T) -> Result<T> {
        self.check_write()?;
        let mut goals = self.goals.borrow_mut();
        let goal = goals
            .iter_mut()
            .find(|g| g.user_id == user_id && g.id == goal_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "goal",
                id: goal_id.to_string(),
            })?;
        Ok(f(goal))
    }
}

impl StatsStore for InMemoryStore {
    fn read_weekly_stats(&self, user_id: &str, week_ending: NaiveDate) -> Result<Option<WeeklyStats>> {
        if self.unavailable.borrow().contains(user_id) {
            return Err(CoreError::Store(format!("stats for {user_id} unavailable")));
        }
        if let Some(stats) = self.pinned_stats.borrow().get(user_id) {
            return Ok(Some(*stats));
        }

        let checkins = self.checkins.borrow();
        let completions = self.completions.borrow();
        let has_activity = checkins.keys().any(|(u, _)| u == user_id)
            || completions.iter().any(|c| c.user_id == user_id);
        if !has_activity {
            return Ok(None);
        }

        let window = week_start(week_ending)..=week_ending;
        let mut stats = WeeklyStats {
            weekly_goal_minutes: self.weekly_goal(user_id)?,
            ..WeeklyStats::default()
        };
        for record in checkins
            .values()
            .filter(|r| r.user_id == user_id && window.contains(&r.date))
        {
            stats.checkin_days += 1;
            stats.total_study_minutes = stats.total_study_minutes.saturating_add(record.study_minutes);
            stats.completed_tasks = stats.completed_tasks.saturating_add(record.completed_task_count);
        }
        let sessions = completions
            .iter()
            .filter(|c| c.user_id == user_id && c.phase == Phase::Work && window.contains(&c.date))
            .count();
        stats.pomodoro_sessions = u32::try_from(sessions).unwrap_or(u32::MAX);
        stats.weekly_progress_minutes = stats.total_study_minutes;
        Ok(Some(stats))
    }

    fn write_checkin(&self, checkin: &NewCheckin) -> Result<CheckinRecord> {
        self.check_write()?;
        let record = self
            .checkins
            .borrow_mut()
            .entry((checkin.user_id.clone(), checkin.date))
            .or_insert_with(|| CheckinRecord::from_new(checkin))
            .clone();
        Ok(record)
    }

    fn checkin_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        Ok(self
            .checkins
            .borrow()
            .keys()
            .filter(|(u, _)| u == user_id)
            .map(|(_, date)| *date)
            .collect())
    }

    fn write_session_completion(&self, completion: &SessionCompletion) -> Result<()> {
        self.check_write()?;
        self.completions.borrow_mut().push(completion.clone());
        Ok(())
    }

    fn weekly_goal(&self, user_id: &str) -> Result<u32> {
        Ok(self
            .weekly_goals
            .borrow()
            .get(user_id)
            .copied()
            .unwrap_or(DEFAULT_WEEKLY_GOAL_MINUTES))
    }
}

impl GoalStore for InMemoryStore {
    fn create_goal(&self, goal: &SessionGoal) -> Result<()> {
        self.check_write()?;
        self.goals.borrow_mut().push(goal.clone());
        Ok(())
    }

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SessionGoal>> {
        Ok(self
            .goals
            .borrow()
            .iter()
            .find(|g| g.user_id == user_id && g.id == goal_id)
            .cloned())
    }

    fn list_goals(&self, user_id: &str, active_only: bool) -> Result<Vec<SessionGoal>> {
        Ok(self
            .goals
            .borrow()
            .iter()
            .filter(|g| g.user_id == user_id && (!active_only || g.is_active))
            .cloned()
            .collect())
    }

    fn update_goal_progress(&self, user_id: &str, goal_id: &str, percent: u8) -> Result<()> {
        self.with_goal(user_id, goal_id, |g| g.current_progress_percent = percent.min(100))
    }

    fn set_goal_active(&self, user_id: &str, goal_id: &str, active: bool) -> Result<()> {
        self.with_goal(user_id, goal_id, |g| g.is_active = active)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::countdown::{compute_remaining, Remaining};
use super::pacer::{pace, total_duration_days, Pacing};
use super::SessionGoal;
use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::ports::GoalStore;

/// Input for goal creation. `start` defaults to now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub target: Option<DateTime<Utc>>,
}

/// A goal with its countdown and pacing evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalView {
    pub goal: SessionGoal,
    pub remaining: Remaining,
    pub pacing: Pacing,
}

pub struct GoalService<'a, S: GoalStore + ?Sized, C: Clock> {
    store: &'a S,
    clock: C,
}

impl<'a, S: GoalStore + ?Sized, C: Clock> GoalService<'a, S, C> {
    pub fn new(store: &'a S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Validates fully before touching the store, so a rejected goal leaves
    /// nothing behind.
    pub fn create(&self, user_id: &str, new: NewGoal) -> Result<SessionGoal> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()).into());
        }
        let target = new
            .target
            .ok_or_else(|| ValidationError::Empty("target".into()))?;
        let start = new.start.unwrap_or_else(|| self.clock.now());
        total_duration_days(start, target)?;

        let goal = SessionGoal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: new
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            start,
            target,
            is_active: true,
            current_progress_percent: 0,
        };
        self.store.create_goal(&goal)?;
        tracing::info!(goal = %goal.id, user = user_id, "goal created");
        Ok(goal)
    }

    pub fn get(&self, user_id: &str, goal_id: &str) -> Result<SessionGoal> {
        self.store
            .get_goal(user_id, goal_id)?
            .ok_or_else(|| CoreError::NotFound {
                entity: "goal",
                id: goal_id.to_string(),
            })
    }

    /// Values above 100 are clamped.
    pub fn update_progress(&self, user_id: &str, goal_id: &str, percent: u32) -> Result<SessionGoal> {
        let percent = percent.min(100) as u8;
        self.store.update_goal_progress(user_id, goal_id, percent)?;
        self.get(user_id, goal_id)
    }

    pub fn deactivate(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.store.set_goal_active(user_id, goal_id, false)?;
        tracing::debug!(goal = goal_id, "goal deactivated");
        Ok(())
    }

    pub fn view(&self, user_id: &str, goal_id: &str) -> Result<GoalView> {
        let goal = self.get(user_id, goal_id)?;
        self.evaluate(goal)
    }

    /// Pending goals nearest their D-Day first, expired goals last.
    pub fn list(&self, user_id: &str, active_only: bool) -> Result<Vec<GoalView>> {
        let mut views = self
            .store
            .list_goals(user_id, active_only)?
            .into_iter()
            .map(|goal| self.evaluate(goal))
            .collect::<Result<Vec<_>>>()?;
        views.sort_by(|a, b| {
            a.remaining
                .is_expired
                .cmp(&b.remaining.is_expired)
                .then(a.goal.target.cmp(&b.goal.target))
        });
        Ok(views)
    }

    fn evaluate(&self, goal: SessionGoal) -> Result<GoalView> {
        let now = self.clock.now();
        let pacing = pace(&goal, now)?;
        Ok(GoalView {
            remaining: compute_remaining(goal.target, now),
            pacing,
            goal,
        })
    }
}

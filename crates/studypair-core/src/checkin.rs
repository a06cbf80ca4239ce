//! Daily check-ins and the streak derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::ports::StatsStore;
use crate::streak::{self, StreakSummary};

/// Longest note accepted with a check-in, in characters.
pub const MAX_NOTE_CHARS: usize = 500;

/// A check-in as submitted, before the store has accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckin {
    pub user_id: String,
    pub date: NaiveDate,
    pub study_minutes: u32,
    pub completed_task_count: u32,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl NewCheckin {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::Empty("user_id".into()));
        }
        if let Some(note) = &self.note {
            let len = note.chars().count();
            if len > MAX_NOTE_CHARS {
                return Err(ValidationError::invalid(
                    "note",
                    format!("{len} characters exceeds the limit of {MAX_NOTE_CHARS}"),
                ));
            }
        }
        Ok(())
    }
}

/// Stored check-in. At most one exists per `(user_id, date)` and it never
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub study_minutes: u32,
    pub completed_task_count: u32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CheckinRecord {
    pub fn from_new(new: &NewCheckin) -> Self {
        Self {
            user_id: new.user_id.clone(),
            date: new.date,
            study_minutes: new.study_minutes,
            completed_task_count: new.completed_task_count,
            note: new.note.clone(),
            created_at: new.submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinOutcome {
    pub record: CheckinRecord,
    pub streak: StreakSummary,
}

/// Submits check-ins for "today" and reports the resulting streak.
pub struct CheckinService<'a, S: StatsStore + ?Sized, C: Clock> {
    store: &'a S,
    clock: C,
}

impl<'a, S: StatsStore + ?Sized, C: Clock> CheckinService<'a, S, C> {
    pub fn new(store: &'a S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Check in for the clock's current calendar day.
    pub fn check_in(
        &self,
        user_id: &str,
        study_minutes: u32,
        completed_task_count: u32,
        note: Option<String>,
    ) -> Result<CheckinOutcome> {
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.submit(NewCheckin {
            user_id: user_id.to_string(),
            date: self.clock.today(),
            study_minutes,
            completed_task_count,
            note,
            submitted_at: self.clock.now(),
        })
    }

    /// Write errors are returned as-is; the caller decides whether to retry.
    pub fn submit(&self, checkin: NewCheckin) -> Result<CheckinOutcome> {
        checkin.validate()?;
        let record = self.store.write_checkin(&checkin)?;
        if record.created_at != checkin.submitted_at {
            tracing::debug!(user = %record.user_id, date = %record.date, "check-in already existed");
        }
        let streak = self.streak(&checkin.user_id)?;
        tracing::info!(
            user = %record.user_id,
            date = %record.date,
            streak = streak.current_streak,
            "check-in recorded"
        );
        Ok(CheckinOutcome { record, streak })
    }

    pub fn streak(&self, user_id: &str) -> Result<StreakSummary> {
        let dates = self.store.checkin_dates(user_id)?;
        Ok(streak::summarize(&dates, self.clock.today()))
    }
}

//! SQLite-backed stats and goal store.
//!
//! Provides persistent storage for:
//! - Daily check-ins (one row per user per day)
//! - Completed pomodoro phases
//! - Goals
//! - Key-value store for application state (saved timer, weekly goals)

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, week_start, DEFAULT_WEEKLY_GOAL_MINUTES};
use crate::checkin::{CheckinRecord, NewCheckin};
use crate::error::{CoreError, DatabaseError, Result};
use crate::goal::SessionGoal;
use crate::ports::{GoalStore, SessionCompletion, StatsStore};
use crate::progress::WeeklyStats;

const DATE_FMT: &str = "%Y-%m-%d";

/// SQLite database implementing [`StatsStore`] and [`GoalStore`].
pub struct Database {
    conn: Connection,
    default_weekly_goal: u32,
}

impl Database {
    /// Open the database at `~/.config/studypair/studypair.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("studypair.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests and embedding).
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn,
            default_weekly_goal: DEFAULT_WEEKLY_GOAL_MINUTES,
        };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Weekly goal reported for users without their own.
    pub fn with_default_weekly_goal(mut self, minutes: u32) -> Self {
        self.default_weekly_goal = minutes;
        self
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS checkins (
                user_id              TEXT NOT NULL,
                date                 TEXT NOT NULL,
                study_minutes        INTEGER NOT NULL,
                completed_task_count INTEGER NOT NULL,
                note                 TEXT,
                created_at           TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      TEXT NOT NULL,
                phase        TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                date         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS goals (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT,
                start_at    TEXT NOT NULL,
                target_at   TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1,
                progress    INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_date ON sessions(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, is_active);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn set_weekly_goal(&self, user_id: &str, minutes: u32) -> Result<()> {
        self.kv_set(&weekly_goal_key(user_id), &minutes.to_string())
    }

    fn has_activity(&self, user_id: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM checkins WHERE user_id = ?1)
                 OR EXISTS(SELECT 1 FROM sessions WHERE user_id = ?1)",
            params![user_id],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn read_checkin(&self, user_id: &str, date: NaiveDate) -> Result<Option<CheckinRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT user_id, date, study_minutes, completed_task_count, note, created_at
                 FROM checkins WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.format(DATE_FMT).to_string()],
                checkin_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn update_goal(&self, sql: &str, user_id: &str, goal_id: &str, value: i64) -> Result<()> {
        let changed = self.conn.execute(sql, params![value, user_id, goal_id])?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                entity: "goal",
                id: goal_id.to_string(),
            });
        }
        Ok(())
    }
}

impl StatsStore for Database {
    fn read_weekly_stats(&self, user_id: &str, week_ending: NaiveDate) -> Result<Option<WeeklyStats>> {
        if !self.has_activity(user_id)? {
            return Ok(None);
        }
        let from = week_start(week_ending).format(DATE_FMT).to_string();
        let to = week_ending.format(DATE_FMT).to_string();

        let (checkin_days, study_minutes, tasks) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(study_minutes), 0), COALESCE(SUM(completed_task_count), 0)
             FROM checkins
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            params![user_id, from, to],
            |row| Ok((count_col(row, 0)?, count_col(row, 1)?, count_col(row, 2)?)),
        )?;

        let pomodoro_sessions = self.conn.query_row(
            "SELECT COUNT(*)
             FROM sessions
             WHERE user_id = ?1 AND phase = 'work' AND date BETWEEN ?2 AND ?3",
            params![user_id, from, to],
            |row| count_col(row, 0),
        )?;

        Ok(Some(WeeklyStats {
            total_study_minutes: study_minutes,
            completed_tasks: tasks,
            pomodoro_sessions,
            checkin_days,
            weekly_goal_minutes: self.weekly_goal(user_id)?,
            weekly_progress_minutes: study_minutes,
        }))
    }

    fn write_checkin(&self, checkin: &NewCheckin) -> Result<CheckinRecord> {
        self.conn.execute(
            "INSERT INTO checkins (user_id, date, study_minutes, completed_task_count, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, date) DO NOTHING",
            params![
                checkin.user_id,
                checkin.date.format(DATE_FMT).to_string(),
                checkin.study_minutes,
                checkin.completed_task_count,
                checkin.note,
                checkin.submitted_at.to_rfc3339(),
            ],
        )?;
        self.read_checkin(&checkin.user_id, checkin.date)?
            .ok_or_else(|| CoreError::Store(format!("check-in for {} vanished after upsert", checkin.date)))
    }

    fn checkin_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM checkins WHERE user_id = ?1 ORDER BY date DESC")?;
        let rows = stmt.query_map(params![user_id], |row| date_col(row, 0))?;
        let mut dates = Vec::new();
        for date in rows {
            dates.push(date?);
        }
        Ok(dates)
    }

    fn write_session_completion(&self, completion: &SessionCompletion) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (user_id, phase, duration_min, completed_at, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                completion.user_id,
                completion.phase.as_str(),
                completion.duration_minutes,
                completion.completed_at.to_rfc3339(),
                completion.date.format(DATE_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn weekly_goal(&self, user_id: &str) -> Result<u32> {
        let stored = self
            .kv_get(&weekly_goal_key(user_id))?
            .and_then(|v| v.parse::<u32>().ok());
        Ok(stored.unwrap_or(self.default_weekly_goal))
    }
}

impl GoalStore for Database {
    fn create_goal(&self, goal: &SessionGoal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, user_id, title, description, start_at, target_at, is_active, progress)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                goal.id,
                goal.user_id,
                goal.title,
                goal.description,
                goal.start.to_rfc3339(),
                goal.target.to_rfc3339(),
                goal.is_active,
                goal.current_progress_percent,
            ],
        )?;
        Ok(())
    }

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SessionGoal>> {
        let goal = self
            .conn
            .query_row(
                "SELECT id, user_id, title, description, start_at, target_at, is_active, progress
                 FROM goals WHERE user_id = ?1 AND id = ?2",
                params![user_id, goal_id],
                goal_from_row,
            )
            .optional()?;
        Ok(goal)
    }

    fn list_goals(&self, user_id: &str, active_only: bool) -> Result<Vec<SessionGoal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, description, start_at, target_at, is_active, progress
             FROM goals
             WHERE user_id = ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY target_at ASC",
        )?;
        let rows = stmt.query_map(params![user_id, active_only], goal_from_row)?;
        let mut goals = Vec::new();
        for goal in rows {
            goals.push(goal?);
        }
        Ok(goals)
    }

    fn update_goal_progress(&self, user_id: &str, goal_id: &str, percent: u8) -> Result<()> {
        self.update_goal(
            "UPDATE goals SET progress = ?1 WHERE user_id = ?2 AND id = ?3",
            user_id,
            goal_id,
            i64::from(percent.min(100)),
        )
    }

    fn set_goal_active(&self, user_id: &str, goal_id: &str, active: bool) -> Result<()> {
        self.update_goal(
            "UPDATE goals SET is_active = ?1 WHERE user_id = ?2 AND id = ?3",
            user_id,
            goal_id,
            i64::from(active),
        )
    }
}

fn weekly_goal_key(user_id: &str) -> String {
    format!("weekly_goal:{user_id}")
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Aggregates saturate at `u32::MAX` instead of failing conversion.
fn count_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let raw: i64 = row.get(idx)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT).map_err(|e| conversion_error(idx, e))
}

fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn checkin_from_row(row: &Row<'_>) -> rusqlite::Result<CheckinRecord> {
    Ok(CheckinRecord {
        user_id: row.get(0)?,
        date: date_col(row, 1)?,
        study_minutes: row.get(2)?,
        completed_task_count: row.get(3)?,
        note: row.get(4)?,
        created_at: timestamp_col(row, 5)?,
    })
}

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<SessionGoal> {
    Ok(SessionGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        start: timestamp_col(row, 4)?,
        target: timestamp_col(row, 5)?,
        is_active: row.get(6)?,
        current_progress_percent: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn completion(phase: Phase, minutes: u32, at: DateTime<Utc>, date: NaiveDate) -> SessionCompletion {
        SessionCompletion {
            user_id: "ana".into(),
            phase,
            duration_minutes: minutes,
            completed_at: at,
            date,
        }
    }

    fn checkin(user: &str, date: NaiveDate, minutes: u32) -> NewCheckin {
        NewCheckin {
            user_id: user.into(),
            date,
            study_minutes: minutes,
            completed_task_count: 1,
            note: None,
            submitted_at: Utc.from_utc_datetime(&date.and_hms_opt(21, 0, 0).unwrap()),
        }
    }

    #[test]
    fn checkin_upsert_keeps_first_row() {
        let db = Database::open_memory().unwrap();
        let first = db.write_checkin(&checkin("ana", day(3), 60)).unwrap();
        let mut retry = checkin("ana", day(3), 999);
        retry.submitted_at += Duration::minutes(5);
        let second = db.write_checkin(&retry).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.study_minutes, 60);
        assert_eq!(db.checkin_dates("ana").unwrap(), vec![day(3)]);
    }

    #[test]
    fn weekly_stats_cover_seven_days() {
        let db = Database::open_memory().unwrap();
        // day(3) is outside the window ending on day(10).
        for (d, minutes) in [(3, 500), (4, 100), (8, 200), (10, 300)] {
            db.write_checkin(&checkin("ana", day(d), minutes)).unwrap();
        }
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap();
        db.write_session_completion(&completion(Phase::Work, 25, at, day(9))).unwrap();
        db.write_session_completion(&completion(Phase::ShortBreak, 5, at, day(9))).unwrap();
        let month_ago = at - Duration::days(30);
        db.write_session_completion(&completion(Phase::Work, 25, month_ago, month_ago.date_naive()))
            .unwrap();

        let stats = db.read_weekly_stats("ana", day(10)).unwrap().unwrap();
        assert_eq!(stats.checkin_days, 3);
        assert_eq!(stats.total_study_minutes, 600);
        assert_eq!(stats.completed_tasks, 3);
        assert_eq!(stats.pomodoro_sessions, 1);
        assert_eq!(stats.weekly_goal_minutes, 1200);
        assert_eq!(stats.weekly_progress_minutes, 600);
    }

    #[test]
    fn sessions_are_bucketed_by_local_day() {
        let db = Database::open_memory().unwrap();
        // 20:00 on the 10th at UTC-7 is already the 11th in UTC.
        let evening = Utc.with_ymd_and_hms(2025, 3, 11, 3, 0, 0).unwrap();
        db.write_session_completion(&completion(Phase::Work, 25, evening, day(10))).unwrap();
        // 08:00 on the 4th at UTC+9 is still the 3rd in UTC, outside the window.
        let morning = Utc.with_ymd_and_hms(2025, 3, 3, 23, 0, 0).unwrap();
        db.write_session_completion(&completion(Phase::Work, 25, morning, day(4))).unwrap();

        let stats = db.read_weekly_stats("ana", day(10)).unwrap().unwrap();
        assert_eq!(stats.pomodoro_sessions, 2);
        let stats = db.read_weekly_stats("ana", day(9)).unwrap().unwrap();
        assert_eq!(stats.pomodoro_sessions, 1);
    }

    #[test]
    fn huge_totals_saturate() {
        let db = Database::open_memory().unwrap();
        db.write_checkin(&checkin("ana", day(9), 3_000_000_000)).unwrap();
        db.write_checkin(&checkin("ana", day(10), 3_000_000_000)).unwrap();

        let stats = db.read_weekly_stats("ana", day(10)).unwrap().unwrap();
        assert_eq!(stats.total_study_minutes, u32::MAX);
        assert_eq!(stats.weekly_progress_minutes, u32::MAX);
        assert_eq!(stats.checkin_days, 2);
    }

    #[test]
    fn unknown_user_has_no_stats() {
        let db = Database::open_memory().unwrap();
        assert!(db.read_weekly_stats("ghost", day(10)).unwrap().is_none());
    }

    #[test]
    fn weekly_goal_override() {
        let db = Database::open_memory().unwrap().with_default_weekly_goal(600);
        assert_eq!(db.weekly_goal("ana").unwrap(), 600);
        db.set_weekly_goal("ana", 900).unwrap();
        assert_eq!(db.weekly_goal("ana").unwrap(), 900);
    }

    #[test]
    fn goal_crud() {
        let db = Database::open_memory().unwrap();
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let goal = SessionGoal {
            id: "g1".into(),
            user_id: "ana".into(),
            title: "Finals".into(),
            description: Some("chapters 1-9".into()),
            start,
            target: start + Duration::days(30),
            is_active: true,
            current_progress_percent: 0,
        };
        db.create_goal(&goal).unwrap();
        assert_eq!(db.get_goal("ana", "g1").unwrap().unwrap(), goal);
        assert!(db.get_goal("ben", "g1").unwrap().is_none());

        db.update_goal_progress("ana", "g1", 40).unwrap();
        db.set_goal_active("ana", "g1", false).unwrap();
        let stored = db.get_goal("ana", "g1").unwrap().unwrap();
        assert_eq!(stored.current_progress_percent, 40);
        assert!(!stored.is_active);

        assert!(db.list_goals("ana", true).unwrap().is_empty());
        assert_eq!(db.list_goals("ana", false).unwrap().len(), 1);
        assert!(matches!(
            db.update_goal_progress("ana", "nope", 1),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn reopening_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studypair.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.write_checkin(&checkin("ana", day(5), 30)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.checkin_dates("ana").unwrap(), vec![day(5)]);
    }
}

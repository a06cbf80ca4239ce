//! D-Day pacing: how far through the goal's time span we are versus how much
//! progress the user reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::countdown::{compute_remaining, Remaining};
use super::SessionGoal;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    AheadOfSchedule,
    BehindSchedule,
    Ended,
}

impl PaceStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaceStatus::AheadOfSchedule => "ahead of schedule",
            PaceStatus::BehindSchedule => "behind schedule",
            PaceStatus::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub total_duration_days: i64,
    pub elapsed_days: i64,
    /// 0.0 ..= 100.0
    pub time_progress_percent: f64,
    pub current_progress_percent: u8,
    pub status: PaceStatus,
    pub remaining: Remaining,
}

/// Calendar days between the two dates (UTC), ignoring time of day.
pub fn calendar_day_diff(target: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    (target.date_naive() - start.date_naive()).num_days()
}

/// Span of a goal in calendar days; anything under one day is rejected.
pub fn total_duration_days(start: DateTime<Utc>, target: DateTime<Utc>) -> Result<i64> {
    let days = calendar_day_diff(target, start);
    if target <= start || days < 1 {
        return Err(CoreError::InvalidGoalRange { start, target });
    }
    Ok(days)
}

pub fn pace(goal: &SessionGoal, now: DateTime<Utc>) -> Result<Pacing> {
    let total = total_duration_days(goal.start, goal.target)?;
    let remaining = compute_remaining(goal.target, now);
    let elapsed = total - remaining.days as i64;
    let time_progress_percent = (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0);

    let current = f64::from(goal.current_progress_percent);
    let status = if remaining.is_expired {
        PaceStatus::Ended
    } else if current >= time_progress_percent {
        PaceStatus::AheadOfSchedule
    } else {
        PaceStatus::BehindSchedule
    };

    Ok(Pacing {
        total_duration_days: total,
        elapsed_days: elapsed,
        time_progress_percent,
        current_progress_percent: goal.current_progress_percent,
        status,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 0, 0, 0).unwrap()
    }

    fn goal(progress: u8) -> SessionGoal {
        SessionGoal {
            id: "g1".into(),
            user_id: "ana".into(),
            title: "Finals".into(),
            description: None,
            start: at(1, 1),
            target: at(1, 31),
            is_active: true,
            current_progress_percent: progress,
        }
    }

    #[test]
    fn halfway_and_ahead() {
        let p = pace(&goal(60), at(1, 16)).unwrap();
        assert_eq!(p.total_duration_days, 30);
        assert_eq!(p.elapsed_days, 15);
        assert_eq!(p.time_progress_percent, 50.0);
        assert_eq!(p.status, PaceStatus::AheadOfSchedule);
        assert_eq!(p.status.label(), "ahead of schedule");
    }

    #[test]
    fn tie_counts_as_ahead() {
        let p = pace(&goal(50), at(1, 16)).unwrap();
        assert_eq!(p.status, PaceStatus::AheadOfSchedule);
    }

    #[test]
    fn behind_when_progress_lags() {
        let p = pace(&goal(20), at(1, 16)).unwrap();
        assert_eq!(p.status, PaceStatus::BehindSchedule);
    }

    #[test]
    fn expired_goal_has_ended() {
        let p = pace(&goal(100), at(2, 2)).unwrap();
        assert_eq!(p.status, PaceStatus::Ended);
        assert_eq!(p.time_progress_percent, 100.0);
    }

    #[test]
    fn before_start_clamps_to_zero() {
        let mut g = goal(0);
        g.start = at(3, 1);
        g.target = at(3, 11);
        let p = pace(&g, at(2, 1)).unwrap();
        assert_eq!(p.time_progress_percent, 0.0);
        assert_eq!(p.status, PaceStatus::AheadOfSchedule);
    }

    #[test]
    fn rejects_inverted_and_same_day_ranges() {
        assert!(matches!(
            total_duration_days(at(1, 31), at(1, 1)),
            Err(CoreError::InvalidGoalRange { .. })
        ));
        let morning = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        assert!(total_duration_days(morning, evening).is_err());
    }

    #[test]
    fn late_evening_to_next_morning_is_one_day() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let target = Utc.with_ymd_and_hms(2025, 1, 2, 1, 0, 0).unwrap();
        assert_eq!(total_duration_days(start, target).unwrap(), 1);
    }
}

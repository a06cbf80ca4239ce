//! Integration tests for paired weekly progress.
//!
//! Covers the full path from check-ins and completed pomodoros in the store
//! to the compared, partner-aware progress view.

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use studypair_core::{
    CheckinService, Clock, ClockedSession, Comparison, Database, InMemoryStore, ManualClock, Metric, NoopNotificationSink,
    Phase, PomodoroEngine, ProgressAggregator, SessionCompletion, StatsStore, UserContext, WeeklyStats,
};

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 13, 18, 0, 0).unwrap())
}

fn weekly(study: u32) -> WeeklyStats {
    WeeklyStats {
        total_study_minutes: study,
        completed_tasks: 4,
        pomodoro_sessions: 8,
        checkin_days: 5,
        weekly_goal_minutes: 1200,
        weekly_progress_minutes: study,
    }
}

#[test]
fn test_paired_comparison_from_pinned_stats() {
    let store = InMemoryStore::new();
    store.pin_weekly_stats("ana", weekly(600));
    store.pin_weekly_stats("ben", weekly(450));
    let clock = clock();

    let progress = ProgressAggregator::new(&store, &clock)
        .sync(&UserContext::paired("ana", "ben"))
        .unwrap();

    let study = progress.comparison(Metric::StudyTime).unwrap();
    assert_eq!(study.own_standing, Comparison::Ahead);
    assert_eq!(study.partner_standing, Comparison::Behind);
    assert_eq!(
        progress.comparison(Metric::CheckinDays).unwrap().own_standing,
        Comparison::Tied
    );
    assert_eq!(progress.own.weekly_progress_percent, 50.0);
    assert_eq!(progress.partner.unwrap().stats.weekly_progress_percent, 37.5);
}

#[test]
fn test_unpaired_user_gets_own_stats_only() {
    let store = InMemoryStore::new();
    store.pin_weekly_stats("ana", weekly(900));
    let clock = clock();

    let progress = ProgressAggregator::new(&store, &clock)
        .sync(&UserContext::solo("ana"))
        .unwrap();
    assert!(progress.partner.is_none());
    assert_eq!(progress.own.weekly_progress_percent, 75.0);
}

#[test]
fn test_partner_without_data_is_omitted() {
    let store = InMemoryStore::new();
    store.pin_weekly_stats("ana", weekly(100));
    let clock = clock();

    let progress = ProgressAggregator::new(&store, &clock)
        .sync(&UserContext::paired("ana", "nobody-yet"))
        .unwrap();
    assert!(progress.partner.is_none());
}

#[test]
fn test_unavailable_partner_is_tolerated() {
    let store = InMemoryStore::new();
    store.pin_weekly_stats("ana", weekly(100));
    store.pin_weekly_stats("ben", weekly(100));
    store.set_unavailable("ben", true);
    let clock = clock();

    let progress = ProgressAggregator::new(&store, &clock)
        .sync(&UserContext::paired("ana", "ben"))
        .unwrap();
    assert!(progress.partner.is_none());
}

#[test]
fn test_own_read_failure_propagates() {
    let store = InMemoryStore::new();
    store.set_unavailable("ana", true);
    let clock = clock();

    let result = ProgressAggregator::new(&store, &clock).sync(&UserContext::solo("ana"));
    assert!(result.unwrap_err().is_retryable());
}

#[test]
fn test_sync_is_idempotent() {
    let db = Database::open_memory().unwrap();
    let clock = clock();
    let checkins = CheckinService::new(&db, &clock);
    checkins.check_in("ana", 120, 3, None).unwrap();
    checkins.check_in("ben", 90, 1, None).unwrap();

    let aggregator = ProgressAggregator::new(&db, &clock);
    let ctx = UserContext::paired("ana", "ben");
    let first = aggregator.sync(&ctx).unwrap();
    let second = aggregator.sync(&ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_week_of_activity_in_sqlite() {
    let db = Database::open_memory().unwrap();
    db.set_weekly_goal("ana", 600).unwrap();
    let clock = clock();
    let start = clock.now() - Duration::days(6);
    clock.set(start);

    for day in 0..7 {
        let checkins = CheckinService::new(&db, &clock);
        checkins.check_in("ana", 60, 1, None).unwrap();
        if day % 2 == 0 {
            checkins.check_in("ben", 30, 2, None).unwrap();
        }
        db.write_session_completion(&SessionCompletion {
            user_id: "ana".into(),
            phase: Phase::Work,
            duration_minutes: 25,
            completed_at: clock.now(),
            date: clock.today(),
        })
        .unwrap();
        clock.advance(Duration::days(1));
    }
    clock.advance(Duration::days(-1));

    let progress = ProgressAggregator::new(&db, &clock)
        .sync(&UserContext::paired("ana", "ben"))
        .unwrap();

    assert_eq!(progress.own.stats.checkin_days, 7);
    assert_eq!(progress.own.stats.total_study_minutes, 420);
    assert_eq!(progress.own.stats.pomodoro_sessions, 7);
    assert_eq!(progress.own.weekly_progress_percent, 70.0);

    let partner = progress.partner.as_ref().unwrap();
    assert_eq!(partner.stats.stats.checkin_days, 4);
    assert_eq!(partner.stats.stats.total_study_minutes, 120);
    assert_eq!(partner.stats.weekly_progress_percent, 10.0);

    let tasks = progress.comparison(Metric::CompletedTasks).unwrap();
    assert_eq!((tasks.own, tasks.partner), (7, 8));
    assert_eq!(tasks.own_standing, Comparison::Behind);
}

#[test]
fn test_evening_activity_west_of_utc_counts_toward_local_day() {
    let db = Database::open_memory().unwrap();
    // 2025-03-10 19:00 at UTC-7, already 02:00 on the 11th in UTC.
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 11, 2, 0, 0).unwrap())
        .with_offset(FixedOffset::west_opt(7 * 3600).unwrap());
    let local_day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let outcome = CheckinService::new(&db, &clock).check_in("ana", 50, 1, None).unwrap();
    assert_eq!(outcome.record.date, local_day);

    let mut session = ClockedSession::new("ana", PomodoroEngine::default(), &clock);
    session.start().unwrap();
    clock.advance_secs(25 * 60);
    session.poll(&db, &NoopNotificationSink).unwrap().unwrap();

    let progress = ProgressAggregator::new(&db, &clock)
        .sync(&UserContext::solo("ana"))
        .unwrap();
    assert_eq!(progress.own.stats.checkin_days, 1);
    assert_eq!(progress.own.stats.pomodoro_sessions, 1);

    // A week later the same activity has left the window, on both sides of UTC midnight.
    clock.advance(Duration::days(7));
    let stats = db.read_weekly_stats("ana", clock.today()).unwrap().unwrap();
    assert_eq!((stats.checkin_days, stats.pomodoro_sessions), (0, 0));
    let stats = db.read_weekly_stats("ana", local_day + Duration::days(6)).unwrap().unwrap();
    assert_eq!((stats.checkin_days, stats.pomodoro_sessions), (1, 1));
}

#[test]
fn test_weekly_goal_applies_before_any_activity() {
    let db = Database::open_memory().unwrap().with_default_weekly_goal(900);
    let clock = clock();
    let aggregator = ProgressAggregator::new(&db, &clock);

    let progress = aggregator.sync(&UserContext::solo("ana")).unwrap();
    assert_eq!(progress.own.stats.weekly_goal_minutes, 900);

    db.set_weekly_goal("ana", 600).unwrap();
    let progress = aggregator.sync(&UserContext::solo("ana")).unwrap();
    assert_eq!(progress.own.stats.weekly_goal_minutes, 600);
    assert_eq!(progress.own.weekly_progress_percent, 0.0);
}

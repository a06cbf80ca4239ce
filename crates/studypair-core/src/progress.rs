//! Weekly progress for a user and, when paired, their partner.
//!
//! The aggregator only reads from the [`StatsStore`] and derives values; it
//! never writes. A missing or unreachable partner is not an error: the
//! partner section is simply left out.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Result;
use crate::ports::{StatsStore, UserContext};

/// Aggregates for one user over a 7-day window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub total_study_minutes: u32,
    pub completed_tasks: u32,
    pub pomodoro_sessions: u32,
    pub checkin_days: u32,
    pub weekly_goal_minutes: u32,
    pub weekly_progress_minutes: u32,
}

impl WeeklyStats {
    pub fn progress_percent(&self) -> f64 {
        weekly_progress_percent(self.weekly_progress_minutes, self.weekly_goal_minutes)
    }
}

/// `progress / goal` as a percentage, clamped to 0..=100 and rounded to one
/// decimal. A zero goal yields 0.0.
pub fn weekly_progress_percent(progress_minutes: u32, goal_minutes: u32) -> f64 {
    if goal_minutes == 0 {
        return 0.0;
    }
    let pct = f64::from(progress_minutes) / f64::from(goal_minutes) * 100.0;
    round1(pct.clamp(0.0, 100.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Ahead,
    Behind,
    Tied,
}

impl Comparison {
    /// The same comparison seen from the other side.
    pub fn mirror(self) -> Self {
        match self {
            Comparison::Ahead => Comparison::Behind,
            Comparison::Behind => Comparison::Ahead,
            Comparison::Tied => Comparison::Tied,
        }
    }
}

pub fn compare(own: u32, partner: u32) -> Comparison {
    match own.cmp(&partner) {
        std::cmp::Ordering::Greater => Comparison::Ahead,
        std::cmp::Ordering::Less => Comparison::Behind,
        std::cmp::Ordering::Equal => Comparison::Tied,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    StudyTime,
    CompletedTasks,
    PomodoroSessions,
    CheckinDays,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::StudyTime,
        Metric::CompletedTasks,
        Metric::PomodoroSessions,
        Metric::CheckinDays,
    ];

    pub fn value(self, stats: &WeeklyStats) -> u32 {
        match self {
            Metric::StudyTime => stats.total_study_minutes,
            Metric::CompletedTasks => stats.completed_tasks,
            Metric::PomodoroSessions => stats.pomodoro_sessions,
            Metric::CheckinDays => stats.checkin_days,
        }
    }

    /// Accepts both `study_time` and `studyTime` spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "study_time" | "studyTime" => Some(Metric::StudyTime),
            "completed_tasks" | "completedTasks" => Some(Metric::CompletedTasks),
            "pomodoro_sessions" | "pomodoroSessions" => Some(Metric::PomodoroSessions),
            "checkin_days" | "checkinDays" => Some(Metric::CheckinDays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub user_id: String,
    pub stats: WeeklyStats,
    pub weekly_progress_percent: f64,
}

impl StatsView {
    fn new(user_id: &str, stats: WeeklyStats) -> Self {
        Self {
            user_id: user_id.to_string(),
            weekly_progress_percent: stats.progress_percent(),
            stats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub own: u32,
    pub partner: u32,
    /// Standing of the user relative to the partner.
    pub own_standing: Comparison,
    /// Standing of the partner relative to the user.
    pub partner_standing: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProgress {
    pub stats: StatsView,
    pub comparisons: Vec<MetricComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedProgress {
    pub own: StatsView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerProgress>,
}

impl PairedProgress {
    /// Build from already-loaded stats.
    pub fn build(own_id: &str, own: WeeklyStats, partner: Option<(&str, WeeklyStats)>) -> Self {
        let partner = partner.map(|(partner_id, theirs)| PartnerProgress {
            comparisons: Metric::ALL
                .iter()
                .map(|&metric| {
                    let mine = metric.value(&own);
                    let other = metric.value(&theirs);
                    let own_standing = compare(mine, other);
                    MetricComparison {
                        metric,
                        own: mine,
                        partner: other,
                        own_standing,
                        partner_standing: own_standing.mirror(),
                    }
                })
                .collect(),
            stats: StatsView::new(partner_id, theirs),
        });
        Self {
            own: StatsView::new(own_id, own),
            partner,
        }
    }

    pub fn comparison(&self, metric: Metric) -> Option<&MetricComparison> {
        self.partner
            .as_ref()?
            .comparisons
            .iter()
            .find(|c| c.metric == metric)
    }
}

pub struct ProgressAggregator<'a, S: StatsStore + ?Sized, C: Clock> {
    store: &'a S,
    clock: C,
}

impl<'a, S: StatsStore + ?Sized, C: Clock> ProgressAggregator<'a, S, C> {
    pub fn new(store: &'a S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Re-read both users' stats and derive every value from scratch.
    ///
    /// Errors reading the user's own stats propagate. Partner read failures
    /// are logged and the partner is omitted.
    pub fn sync(&self, user: &UserContext) -> Result<PairedProgress> {
        let today = self.clock.today();
        let own = match self.store.read_weekly_stats(&user.user_id, today)? {
            Some(stats) => stats,
            // No activity yet still reports against the user's goal.
            None => WeeklyStats {
                weekly_goal_minutes: self.store.weekly_goal(&user.user_id)?,
                ..WeeklyStats::default()
            },
        };

        let partner = match user.partner_id.as_deref() {
            None => None,
            Some(partner_id) => match self.store.read_weekly_stats(partner_id, today) {
                Ok(Some(stats)) => Some((partner_id, stats)),
                Ok(None) => {
                    tracing::debug!(partner = partner_id, "partner has no stats yet");
                    None
                }
                Err(e) => {
                    tracing::warn!(partner = partner_id, error = %e, "partner stats unavailable");
                    None
                }
            },
        };

        Ok(PairedProgress::build(&user.user_id, own, partner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(study: u32, tasks: u32, sessions: u32, days: u32) -> WeeklyStats {
        WeeklyStats {
            total_study_minutes: study,
            completed_tasks: tasks,
            pomodoro_sessions: sessions,
            checkin_days: days,
            weekly_goal_minutes: 1200,
            weekly_progress_minutes: study,
        }
    }

    #[test]
    fn percent_and_clamp() {
        assert_eq!(weekly_progress_percent(900, 1200), 75.0);
        assert_eq!(weekly_progress_percent(1300, 1200), 100.0);
        assert_eq!(weekly_progress_percent(0, 1200), 0.0);
        assert_eq!(weekly_progress_percent(100, 0), 0.0);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(weekly_progress_percent(1, 3), 33.3);
        assert_eq!(weekly_progress_percent(2, 3), 66.7);
    }

    #[test]
    fn compare_is_strict() {
        assert_eq!(compare(600, 450), Comparison::Ahead);
        assert_eq!(compare(450, 600), Comparison::Behind);
        assert_eq!(compare(7, 7), Comparison::Tied);
        assert_eq!(Comparison::Tied.mirror(), Comparison::Tied);
    }

    #[test]
    fn build_compares_every_metric() {
        let p = PairedProgress::build("ana", stats(600, 3, 10, 5), Some(("ben", stats(450, 3, 12, 5))));
        let study = p.comparison(Metric::StudyTime).unwrap();
        assert_eq!(study.own_standing, Comparison::Ahead);
        assert_eq!(study.partner_standing, Comparison::Behind);
        assert_eq!(p.comparison(Metric::CompletedTasks).unwrap().own_standing, Comparison::Tied);
        assert_eq!(p.comparison(Metric::PomodoroSessions).unwrap().own_standing, Comparison::Behind);
        assert_eq!(p.own.weekly_progress_percent, 50.0);
        assert_eq!(p.partner.as_ref().unwrap().stats.weekly_progress_percent, 37.5);
    }

    #[test]
    fn solo_progress_omits_partner_when_serialized() {
        let p = PairedProgress::build("ana", stats(60, 1, 2, 1), None);
        assert!(p.comparison(Metric::StudyTime).is_none());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("partner").is_none());
    }

    #[test]
    fn new_user_reports_against_their_goal() {
        let store = crate::storage::InMemoryStore::new();
        store.set_weekly_goal("ana", 600);
        let clock = crate::clock::ManualClock::new(chrono::Utc::now());

        let p = ProgressAggregator::new(&store, &clock)
            .sync(&UserContext::solo("ana"))
            .unwrap();
        assert_eq!(p.own.stats.weekly_goal_minutes, 600);
        assert_eq!(p.own.stats.total_study_minutes, 0);
        assert_eq!(p.own.weekly_progress_percent, 0.0);
    }

    #[test]
    fn metric_parse_accepts_both_spellings() {
        assert_eq!(Metric::parse("studyTime"), Some(Metric::StudyTime));
        assert_eq!(Metric::parse("checkin_days"), Some(Metric::CheckinDays));
        assert_eq!(Metric::parse("mood"), None);
    }
}

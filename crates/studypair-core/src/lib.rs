//! # StudyPair Core Library
//!
//! This library provides the timing and progress logic for StudyPair, a
//! study tracker for two paired users. Hosts (the CLI, a UI tick, a request
//! handler) drive it with explicit time deltas or on-demand calls; the core
//! owns no timers and no threads.
//!
//! ## Architecture
//!
//! - **Timer**: A delta-driven pomodoro state machine, plus a clock-backed
//!   driver that derives deltas from wall-clock time
//! - **Goals**: D-Day countdowns and time-versus-progress pacing
//! - **Streaks**: Consecutive-day check-in runs and tiers
//! - **Progress**: Weekly stats for a user and partner, compared per metric
//! - **Storage**: TOML configuration and a SQLite adapter for the store ports
//!
//! ## Key Components
//!
//! - [`PomodoroEngine`]: Work/break cycle state machine
//! - [`ClockedSession`]: Wall-clock driver that persists phase completions
//! - [`GoalService`]: Goal creation, progress updates and countdown views
//! - [`CheckinService`]: Daily check-ins and streak summaries
//! - [`ProgressAggregator`]: Paired weekly progress
//! - [`StatsStore`] / [`GoalStore`]: Collaborator contracts

pub mod checkin;
pub mod clock;
pub mod error;
pub mod events;
pub mod goal;
pub mod ports;
pub mod progress;
pub mod storage;
pub mod streak;
pub mod timer;

pub use checkin::{CheckinOutcome, CheckinRecord, CheckinService, NewCheckin};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use goal::{compute_remaining, GoalService, GoalView, NewGoal, PaceStatus, Pacing, Remaining, SessionGoal};
pub use ports::{
    GoalStore, LogNotificationSink, NoopNotificationSink, NotificationSink, SessionCompletion, StatsStore, UserContext,
};
pub use progress::{
    compare, weekly_progress_percent, Comparison, Metric, PairedProgress, ProgressAggregator, WeeklyStats,
};
pub use storage::{Config, Database, InMemoryStore};
pub use streak::{StreakSummary, StreakTier};
pub use timer::{ClockedSession, Phase, PomodoroConfig, PomodoroEngine, PomodoroState, RunState};

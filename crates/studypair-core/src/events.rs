use serde::{Deserialize, Serialize};

use crate::timer::{Phase, PomodoroState};

/// Every timer state change produces an Event.
/// Hosts render them; phase completions are forwarded to the stats store
/// and the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_seconds: u64,
        /// True when leaving Paused rather than Idle.
        resumed: bool,
    },
    TimerPaused {
        phase: Phase,
        remaining_seconds: u64,
    },
    TimerReset {
        completed_work_sessions: u32,
    },
    WorkSessionCompleted {
        duration_minutes: u32,
        completed_work_sessions: u32,
        next_phase: Phase,
    },
    BreakCompleted {
        phase: Phase,
        duration_minutes: u32,
    },
    StateSnapshot {
        state: PomodoroState,
        phase_progress: f64,
    },
}

impl Event {
    /// The finished phase and its configured length, for completion events.
    pub fn completed_phase(&self) -> Option<(Phase, u32)> {
        match self {
            Event::WorkSessionCompleted {
                duration_minutes, ..
            } => Some((Phase::Work, *duration_minutes)),
            Event::BreakCompleted {
                phase,
                duration_minutes,
            } => Some((*phase, *duration_minutes)),
            _ => None,
        }
    }
}

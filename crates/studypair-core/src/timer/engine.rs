//! Pomodoro engine implementation.
//!
//! The engine is a delta-driven state machine. It owns no timer and reads no
//! clock - the host calls `tick(delta_seconds)` with elapsed wall-clock time
//! (see [`ClockedSession`](super::ClockedSession) for a clock-backed driver).
//!
//! ## State Transitions
//!
//! ```text
//! run state:  Idle -> Running <-> Paused      (reset -> Idle)
//! phase:      Work -> ShortBreak | LongBreak -> Work
//! ```
//!
//! ## Usage
//!
//! ```
//! use studypair_core::timer::{PomodoroConfig, PomodoroEngine, Phase};
//!
//! let mut engine = PomodoroEngine::new(PomodoroConfig::default()).unwrap();
//! engine.start().unwrap();
//! let event = engine.tick(25 * 60);
//! assert!(event.is_some());
//! assert_eq!(engine.phase(), Phase::ShortBreak);
//! ```

use serde::{Deserialize, Serialize};

use super::config::{Phase, PomodoroConfig};
use crate::error::{CoreError, Result};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Everything needed to resume a session exactly where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub completed_work_sessions: u32,
    pub run_state: RunState,
}

impl PomodoroState {
    fn initial(config: &PomodoroConfig) -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: config.seconds_for(Phase::Work),
            completed_work_sessions: 0,
            run_state: RunState::Idle,
        }
    }
}

/// Work/break cycle state machine.
///
/// Each instance owns its state, so independent sessions never interfere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroEngine {
    config: PomodoroConfig,
    state: PomodoroState,
}

impl PomodoroEngine {
    /// Create an engine at the start of a work phase, Idle.
    pub fn new(config: PomodoroConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: PomodoroState::initial(&config),
            config,
        })
    }

    /// Rebuild an engine from a previously captured [`PomodoroState`].
    pub fn restore(config: PomodoroConfig, state: PomodoroState) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, state })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    pub fn state(&self) -> &PomodoroState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.state.completed_work_sessions
    }

    /// 0.0 .. 1.0 progress within the current phase.
    ///
    /// Measured against the current config, so a phase started before a
    /// config edit may report slightly off values.
    pub fn phase_progress(&self) -> f64 {
        let total = self.config.seconds_for(self.state.phase);
        if total == 0 {
            return 0.0;
        }
        let remaining = self.state.remaining_seconds.min(total);
        1.0 - (remaining as f64 / total as f64)
    }

    /// Copy of the current state, suitable for persisting.
    pub fn snapshot(&self) -> PomodoroState {
        self.state.clone()
    }

    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            state: self.snapshot(),
            phase_progress: self.phase_progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Event> {
        let resumed = match self.state.run_state {
            RunState::Idle => false,
            RunState::Paused => true,
            RunState::Running => {
                return Err(CoreError::InvalidStateTransition {
                    action: "start",
                    from: RunState::Running,
                })
            }
        };
        self.state.run_state = RunState::Running;
        tracing::debug!(phase = ?self.state.phase, resumed, "timer started");
        Ok(Event::TimerStarted {
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            resumed,
        })
    }

    pub fn pause(&mut self) -> Result<Event> {
        if self.state.run_state != RunState::Running {
            return Err(CoreError::InvalidStateTransition {
                action: "pause",
                from: self.state.run_state,
            });
        }
        self.state.run_state = RunState::Paused;
        tracing::debug!(remaining = self.state.remaining_seconds, "timer paused");
        Ok(Event::TimerPaused {
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
        })
    }

    /// Back to an idle work phase. The completed-session count is kept.
    pub fn reset(&mut self) -> Event {
        self.state.phase = Phase::Work;
        self.state.run_state = RunState::Idle;
        self.state.remaining_seconds = self.config.seconds_for(Phase::Work);
        tracing::debug!("timer reset");
        Event::TimerReset {
            completed_work_sessions: self.state.completed_work_sessions,
        }
    }

    /// End the current phase now, exactly as if it had run out.
    pub fn skip(&mut self) -> Event {
        self.complete_session()
    }

    /// Advance by `delta_seconds` of elapsed time.
    ///
    /// Returns the completion event when the phase runs out. Only the current
    /// phase is consumed; surplus time is not carried into the next one.
    pub fn tick(&mut self, delta_seconds: u64) -> Option<Event> {
        if self.state.run_state != RunState::Running {
            return None;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(delta_seconds);
        if self.state.remaining_seconds == 0 {
            return Some(self.complete_session());
        }
        None
    }

    /// Finish the current phase and move to the next one.
    pub fn complete_session(&mut self) -> Event {
        match self.state.phase {
            Phase::Work => {
                self.state.completed_work_sessions = self.state.completed_work_sessions.saturating_add(1);
                let next = if self.state.completed_work_sessions % self.config.long_break_interval == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                self.enter(next);
                tracing::info!(
                    completed = self.state.completed_work_sessions,
                    next = ?next,
                    "work session completed"
                );
                Event::WorkSessionCompleted {
                    duration_minutes: self.config.work_minutes,
                    completed_work_sessions: self.state.completed_work_sessions,
                    next_phase: next,
                }
            }
            finished @ (Phase::ShortBreak | Phase::LongBreak) => {
                self.enter(Phase::Work);
                tracing::info!(phase = ?finished, "break completed");
                Event::BreakCompleted {
                    phase: finished,
                    duration_minutes: self.config.minutes_for(finished),
                }
            }
        }
    }

    /// Replace the cycle durations. The running countdown keeps its remaining
    /// time; new values apply from the next phase (or after `reset()`).
    pub fn set_config(&mut self, config: PomodoroConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.state.remaining_seconds = self.config.seconds_for(phase);
    }
}

impl Default for PomodoroEngine {
    fn default() -> Self {
        let config = PomodoroConfig::default();
        Self {
            state: PomodoroState::initial(&config),
            config,
        }
    }
}

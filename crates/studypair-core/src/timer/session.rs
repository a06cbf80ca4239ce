//! Clock-backed driver around [`PomodoroEngine`].
//!
//! Elapsed time is always `now - last_tick` from the injected [`Clock`], never
//! a count of host callbacks. After a suspension the whole gap arrives as one
//! catch-up delta. Completed phases are written to the stats store and passed
//! to the notification sink; nothing else is persisted mid-phase.
//!
//! A completion whose store write fails stays pending on the session and is
//! written again by the next `poll` or `skip`, so the engine moving on to the
//! next phase never loses it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{PomodoroEngine, RunState};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::ports::{NotificationSink, SessionCompletion, StatsStore};

/// Serializable form of a [`ClockedSession`], for hosts that stop between ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub user_id: String,
    pub engine: PomodoroEngine,
    #[serde(default)]
    pub last_tick: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending: Option<PendingCompletion>,
}

/// A finished phase not yet accepted by the stats store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCompletion {
    pub event: Event,
    pub completion: SessionCompletion,
}

pub struct ClockedSession<C: Clock> {
    user_id: String,
    engine: PomodoroEngine,
    clock: C,
    /// Set only while Running.
    last_tick: Option<DateTime<Utc>>,
    pending: Option<PendingCompletion>,
}

impl<C: Clock> ClockedSession<C> {
    pub fn new(user_id: impl Into<String>, engine: PomodoroEngine, clock: C) -> Self {
        let last_tick = (engine.run_state() == RunState::Running).then(|| clock.now());
        Self {
            user_id: user_id.into(),
            engine,
            clock,
            last_tick,
            pending: None,
        }
    }

    pub fn restore(saved: SavedSession, clock: C) -> Self {
        let last_tick = match saved.engine.run_state() {
            RunState::Running => saved.last_tick.or_else(|| Some(clock.now())),
            _ => None,
        };
        Self {
            user_id: saved.user_id,
            engine: saved.engine,
            clock,
            last_tick,
            pending: saved.pending,
        }
    }

    pub fn save(&self) -> SavedSession {
        SavedSession {
            user_id: self.user_id.clone(),
            engine: self.engine.clone(),
            last_tick: self.last_tick,
            pending: self.pending.clone(),
        }
    }

    pub fn engine(&self) -> &PomodoroEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PomodoroEngine {
        &mut self.engine
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The completion still waiting for a successful store write, if any.
    pub fn pending(&self) -> Option<&PendingCompletion> {
        self.pending.as_ref()
    }

    pub fn start(&mut self) -> Result<Event> {
        let event = self.engine.start()?;
        self.last_tick = Some(self.clock.now());
        Ok(event)
    }

    /// Applies elapsed time first, so a phase that ran out before the pause
    /// is still recorded. Returns that completion (if any) then the pause.
    pub fn pause(&mut self, store: &dyn StatsStore, sink: &dyn NotificationSink) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if let Some(done) = self.poll(store, sink)? {
            events.push(done);
        }
        events.push(self.engine.pause()?);
        self.last_tick = None;
        Ok(events)
    }

    /// Fails without skipping while an earlier completion can't be written.
    pub fn skip(&mut self, store: &dyn StatsStore, sink: &dyn NotificationSink) -> Result<Event> {
        self.flush(store, sink)?;
        let event = self.engine.skip();
        if self.engine.run_state() == RunState::Running {
            self.last_tick = Some(self.clock.now());
        }
        self.publish(&event, store, sink)?;
        Ok(event)
    }

    pub fn reset(&mut self) -> Event {
        self.last_tick = None;
        self.engine.reset()
    }

    /// Feed the engine the wall-clock time since the previous poll.
    ///
    /// A pending completion is written first and returned on its own; time
    /// keeps accruing and is applied by the following poll.
    pub fn poll(&mut self, store: &dyn StatsStore, sink: &dyn NotificationSink) -> Result<Option<Event>> {
        if let Some(event) = self.flush(store, sink)? {
            return Ok(Some(event));
        }
        let Some(last) = self.last_tick else {
            return Ok(None);
        };
        let now = self.clock.now();
        let elapsed = (now - last).num_seconds();
        if elapsed < 0 {
            tracing::warn!(elapsed, "clock moved backwards; rebasing tick origin");
            self.last_tick = Some(now);
            return Ok(None);
        }
        // Carry sub-second remainders forward instead of dropping them.
        self.last_tick = Some(last + Duration::seconds(elapsed));

        match self.engine.tick(elapsed as u64) {
            Some(event) => {
                if elapsed > 3600 {
                    tracing::debug!(elapsed, "applied catch-up delta");
                }
                self.last_tick = Some(now);
                self.publish(&event, store, sink)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    fn publish(&mut self, event: &Event, store: &dyn StatsStore, sink: &dyn NotificationSink) -> Result<()> {
        if let Some((phase, minutes)) = event.completed_phase() {
            self.pending = Some(PendingCompletion {
                event: event.clone(),
                completion: SessionCompletion {
                    user_id: self.user_id.clone(),
                    phase,
                    duration_minutes: minutes,
                    completed_at: self.clock.now(),
                    date: self.clock.today(),
                },
            });
            self.flush(store, sink)?;
        }
        Ok(())
    }

    fn flush(&mut self, store: &dyn StatsStore, sink: &dyn NotificationSink) -> Result<Option<Event>> {
        let Some(pending) = &self.pending else {
            return Ok(None);
        };
        store.write_session_completion(&pending.completion)?;
        sink.on_phase_complete(&pending.event);
        Ok(self.pending.take().map(|p| p.event))
    }
}

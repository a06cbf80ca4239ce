use clap::Subcommand;
use studypair_core::timer::SavedSession;
use studypair_core::{ClockedSession, Database, Event, LogNotificationSink, PomodoroEngine, SystemClock};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the current phase
    Start,
    /// Pause the running countdown
    Pause,
    /// Finish the current phase early
    Skip,
    /// Back to an idle work phase (completed count is kept)
    Reset,
    /// Print current timer state as JSON
    Status,
}

fn session_key(user_id: &str) -> String {
    format!("timer_session:{user_id}")
}

/// Read errors propagate so a busy database never replaces a saved session.
/// Only a record that no longer parses is discarded.
fn load_session(
    db: &Database,
    user_id: &str,
    engine: PomodoroEngine,
) -> Result<ClockedSession<SystemClock>, Box<dyn std::error::Error>> {
    if let Some(json) = db.kv_get(&session_key(user_id))? {
        match serde_json::from_str::<SavedSession>(&json) {
            Ok(saved) => return Ok(ClockedSession::restore(saved, SystemClock)),
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer session"),
        }
    }
    Ok(ClockedSession::new(user_id, engine, SystemClock))
}

fn save_session(db: &Database, session: &ClockedSession<SystemClock>) -> CliResult {
    let json = serde_json::to_string(&session.save())?;
    db.kv_set(&session_key(session.user_id()), &json)?;
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let (config, db) = open()?;
    let pomodoro = config.pomodoro()?;
    let user_id = config.user.user_id.clone();

    let mut session = load_session(&db, &user_id, PomodoroEngine::new(pomodoro)?)?;
    session.engine_mut().set_config(pomodoro)?;
    let mut events = Vec::new();
    let result = apply(&mut session, &db, action, &mut events);
    // Completions already written must not be replayed next time.
    save_session(&db, &session)?;
    result?;
    print_json(&events)
}

/// Every command prints one JSON array: any catch-up completion first, then
/// the event for the action itself.
fn apply(
    session: &mut ClockedSession<SystemClock>,
    db: &Database,
    action: TimerAction,
    events: &mut Vec<Event>,
) -> CliResult {
    let sink = LogNotificationSink;
    match action {
        TimerAction::Start => {
            // Catch up first so a stale session completes before restarting.
            events.extend(session.poll(db, &sink)?);
            events.push(session.start()?);
        }
        TimerAction::Pause => events.extend(session.pause(db, &sink)?),
        TimerAction::Skip => events.push(session.skip(db, &sink)?),
        TimerAction::Reset => events.push(session.reset()),
        TimerAction::Status => {
            events.extend(session.poll(db, &sink)?);
            events.push(session.engine().snapshot_event());
        }
    }
    Ok(())
}

mod config;
mod engine;
mod session;

pub use config::{Phase, PomodoroConfig};
pub use engine::{PomodoroEngine, PomodoroState, RunState};
pub use session::{ClockedSession, PendingCompletion, SavedSession};

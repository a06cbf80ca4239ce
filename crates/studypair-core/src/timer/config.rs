use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A segment of the pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Phase::Work),
            "short_break" => Some(Phase::ShortBreak),
            "long_break" => Some(Phase::LongBreak),
            _ => None,
        }
    }
}

/// Durations of the work/break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// Every n-th completed work session is followed by a long break.
    pub long_break_interval: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
        }
    }
}

impl PomodoroConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be a positive number of minutes"));
            }
        }
        if self.long_break_interval < 2 {
            return Err(ValidationError::invalid(
                "long_break_interval",
                format!("must be at least 2, got {}", self.long_break_interval),
            ));
        }
        Ok(())
    }

    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    /// Uses saturating arithmetic so absurd configs can't overflow.
    pub fn seconds_for(&self, phase: Phase) -> u64 {
        u64::from(self.minutes_for(phase)).saturating_mul(60)
    }
}

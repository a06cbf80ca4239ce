mod config;
pub mod database;
mod memory;

pub use config::{Config, TimerConfig, UserConfig, WeeklyConfig};
pub use database::Database;
pub use memory::InMemoryStore;

use std::path::PathBuf;

use chrono::{Days, NaiveDate};

use crate::error::{ConfigError, Result};

/// Weekly study target used when a user hasn't set one.
pub const DEFAULT_WEEKLY_GOAL_MINUTES: u32 = 1200;

/// Returns `~/.config/studypair[-dev]/` based on STUDYPAIR_ENV.
///
/// Set STUDYPAIR_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYPAIR_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studypair-dev")
    } else {
        base_dir.join("studypair")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// First day of the 7-day window that ends on `week_ending` (inclusive).
pub(crate) fn week_start(week_ending: NaiveDate) -> NaiveDate {
    week_ending
        .checked_sub_days(Days::new(6))
        .unwrap_or(NaiveDate::MIN)
}

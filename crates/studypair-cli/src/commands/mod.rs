pub mod checkin;
pub mod config;
pub mod goal;
pub mod progress;
pub mod timer;

use serde::Serialize;
use studypair_core::{Config, Database};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load config and open the database with the configured weekly goal.
pub fn open() -> Result<(Config, Database), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?.with_default_weekly_goal(config.weekly.goal_minutes);
    Ok((config, db))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use clap::Subcommand;
use studypair_core::{CheckinService, SystemClock};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record today's study check-in
    Add {
        /// Minutes studied today
        #[arg(long)]
        minutes: u32,
        /// Tasks completed today
        #[arg(long, default_value = "0")]
        tasks: u32,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },
    /// Show the current streak and tier
    Streak,
}

pub fn run(action: CheckinAction) -> CliResult {
    let (config, db) = open()?;
    let user_id = config.user.user_id.as_str();
    let service = CheckinService::new(&db, SystemClock);

    match action {
        CheckinAction::Add { minutes, tasks, note } => {
            let outcome = service.check_in(user_id, minutes, tasks, note)?;
            print_json(&outcome)?;
        }
        CheckinAction::Streak => {
            print_json(&service.streak(user_id)?)?;
        }
    }
    Ok(())
}

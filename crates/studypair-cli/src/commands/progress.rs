use clap::Subcommand;
use studypair_core::{ProgressAggregator, SystemClock};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Weekly stats for you and your partner, compared per metric
    Show,
    /// Set your own weekly study goal
    Goal {
        /// Target minutes per week
        minutes: u32,
    },
}

pub fn run(action: ProgressAction) -> CliResult {
    let (config, db) = open()?;
    let user = config.user_context();

    match action {
        ProgressAction::Show => {
            let progress = ProgressAggregator::new(&db, SystemClock).sync(&user)?;
            print_json(&progress)?;
        }
        ProgressAction::Goal { minutes } => {
            db.set_weekly_goal(&user.user_id, minutes)?;
            println!("weekly goal set: {minutes} minutes");
        }
    }
    Ok(())
}

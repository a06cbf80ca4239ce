use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use studypair_core::{GoalService, NewGoal, SystemClock};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a D-Day goal
    Create {
        /// Goal title
        title: String,
        /// Target date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        target: String,
        /// Start date, defaults to now
        #[arg(long)]
        start: Option<String>,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },
    /// List goals with their countdowns
    List {
        /// Include deactivated goals
        #[arg(long)]
        all: bool,
    },
    /// Show one goal with its pacing
    Show {
        /// Goal ID
        id: String,
    },
    /// Record self-reported progress (0-100)
    Progress {
        /// Goal ID
        id: String,
        /// Percent complete; values above 100 are clamped
        percent: u32,
    },
    /// Stop tracking a goal
    Deactivate {
        /// Goal ID
        id: String,
    },
}

/// Accepts RFC 3339 or a bare date, which means local midnight.
fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid {field} '{value}': expected YYYY-MM-DD or RFC 3339"))?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| format!("invalid {field} '{value}'"))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("invalid {field} '{value}': no such local time"))
}

pub fn run(action: GoalAction) -> CliResult {
    let (config, db) = open()?;
    let user_id = config.user.user_id.as_str();
    let goals = GoalService::new(&db, SystemClock);

    match action {
        GoalAction::Create {
            title,
            target,
            start,
            description,
        } => {
            let new = NewGoal {
                title,
                description,
                start: start.map(|s| parse_instant("start", &s)).transpose()?,
                target: Some(parse_instant("target", &target)?),
            };
            let goal = goals.create(user_id, new)?;
            print_json(&goals.view(user_id, &goal.id)?)?;
        }
        GoalAction::List { all } => {
            print_json(&goals.list(user_id, !all)?)?;
        }
        GoalAction::Show { id } => {
            let view = goals.view(user_id, &id)?;
            eprintln!(
                "{} | {} | {}",
                view.goal.title,
                view.remaining.format_compact(),
                view.pacing.status.label()
            );
            print_json(&view)?;
        }
        GoalAction::Progress { id, percent } => {
            let goal = goals.update_progress(user_id, &id, percent)?;
            print_json(&goal)?;
        }
        GoalAction::Deactivate { id } => {
            goals.deactivate(user_id, &id)?;
            println!("goal deactivated: {id}");
        }
    }
    Ok(())
}

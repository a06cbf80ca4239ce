//! Consecutive-day check-in streaks.
//!
//! A streak is the run of consecutive calendar days with a check-in that
//! ends *today*. If today has no check-in yet the current streak is 0, even
//! when yesterday closed a long run.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Badge earned by streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTier {
    Sprout,
    Initiate,
    Doer,
    Persister,
    Master,
}

impl StreakTier {
    pub const ALL: [StreakTier; 5] = [
        StreakTier::Sprout,
        StreakTier::Initiate,
        StreakTier::Doer,
        StreakTier::Persister,
        StreakTier::Master,
    ];

    /// Inclusive lower bound in days.
    pub fn min_days(self) -> u32 {
        match self {
            StreakTier::Sprout => 0,
            StreakTier::Initiate => 3,
            StreakTier::Doer => 7,
            StreakTier::Persister => 14,
            StreakTier::Master => 30,
        }
    }

    pub fn for_streak(days: u32) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| days >= tier.min_days())
            .unwrap_or(StreakTier::Sprout)
    }

    pub fn label(self) -> &'static str {
        match self {
            StreakTier::Sprout => "sprout",
            StreakTier::Initiate => "initiate",
            StreakTier::Doer => "doer",
            StreakTier::Persister => "persister",
            StreakTier::Master => "master",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.iter().copied().find(|tier| *tier > self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub total_checkins: u32,
    pub tier: StreakTier,
}

impl StreakSummary {
    /// Days of streak still needed for the next tier; `None` at the top.
    pub fn days_to_next_tier(&self) -> Option<u32> {
        self.tier
            .next()
            .map(|next| next.min_days().saturating_sub(self.current_streak))
    }
}

/// Summarize one user's check-in dates relative to `today`.
///
/// Duplicates are ignored. Dates after `today` count toward the total but
/// never toward the streak.
pub fn summarize(dates: &[NaiveDate], today: NaiveDate) -> StreakSummary {
    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let mut current_streak = 0u32;
    for (i, date) in distinct.range(..=today).rev().enumerate() {
        let expected = today.checked_sub_days(Days::new(i as u64));
        if Some(*date) != expected {
            break;
        }
        current_streak += 1;
    }

    StreakSummary {
        current_streak,
        total_checkins: distinct.len() as u32,
        tier: StreakTier::for_streak(current_streak),
    }
}

//! Season-epoch week calendar.
//!
//! Weeks are numbered from the configured season start date: week 1 begins
//! on the start date, week ids advance every whole 7-day period, and the id
//! is capped at the season's total week count rather than erroring past
//! season end.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::config::SeasonConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekInfo {
    pub id: u32,
    /// First day of the week (the season starts on a Friday, so weeks do
    /// too).
    pub week_start: NaiveDate,
}

/// The week `now` falls into. Before the season start this clamps to
/// week 1; past season end it stays at the final week.
pub fn current_week(now: DateTime<Utc>, season: &SeasonConfig) -> WeekInfo {
    let start = season.start_date.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc();
    let days = (now - start).num_days();
    let weeks_elapsed = days.div_euclid(7).max(0) as u64;

    let id = (weeks_elapsed as u32 + 1).min(season.weeks);
    let week_start = season
        .start_date
        .checked_add_days(Days::new(weeks_elapsed * 7))
        .unwrap_or(season.start_date);

    WeekInfo { id, week_start }
}

// League season identifiers ("20242025" style).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month (1-based) at or after which a new season is considered started.
const SEASON_CUTOFF_MONTH: u32 = 7;

/// An 8-digit season code made of the starting and ending years.
///
/// Computed once per run from the clock reading at startup and threaded
/// through every component that needs it. A backtest spanning a real-world
/// season boundary still uses this single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeasonId {
    start_year: i32,
}

impl SeasonId {
    /// Season that contains `date` under the July cutoff rule.
    pub fn containing(date: NaiveDate) -> Self {
        let start_year = if date.month() >= SEASON_CUTOFF_MONTH {
            date.year()
        } else {
            date.year() - 1
        };
        SeasonId { start_year }
    }

    /// Season starting in the given calendar year.
    pub fn starting_in(start_year: i32) -> Self {
        SeasonId { start_year }
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// Numeric form as it appears in league payloads (e.g. `20242025`).
    pub fn code(&self) -> u32 {
        (self.start_year as u32) * 10_000 + (self.end_year() as u32)
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start_year, self.end_year())
    }
}

// Command-line surface of the `scorepick` binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::backtest::default_range;

/// Pick-three goal scorer backtesting and ranking
#[derive(Debug, Parser)]
#[command(name = "scorepick", version)]
#[command(about = "Rank likely goal scorers and backtest the picks against played games")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay the pooled pick heuristic over a date range
    Backtest {
        /// First date to evaluate (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date to evaluate, inclusive (YYYY-MM-DD, default today)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Picks per day
        #[arg(long)]
        top: Option<usize>,
    },
    /// Rank each player set of a saved contest snapshot
    Slots {
        /// Contest snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,
        /// Score the picks against this date instead of the contest date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Grade a saved pick history
    Evaluate {
        /// Pick history JSON
        #[arg(long)]
        history: PathBuf,
    },
}

/// Fill in omitted backtest bounds: `end` defaults to `today`, `start` to
/// the `range_days` days ending on `end`.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    range_days: u32,
) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or(today);
    let (default_start, end) = default_range(end, range_days);
    (start.unwrap_or(default_start), end)
}

// CSV report emitters: per-day backtest rows, run summary, and the full
// ranking of a candidate set for auditing.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use scorepick_core::player::PlayerSeasonStats;

use crate::backtest::{BacktestDayResult, BacktestSummary};

pub const RESULTS_FILE: &str = "backtest_nhl_results.csv";
pub const SUMMARY_FILE: &str = "backtest_nhl_summary.csv";

/// Pick columns in the results file when fewer picks are requested.
pub const MIN_PICK_COLUMNS: usize = 3;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Open a CSV writer at `path`, creating parent directories.
pub(crate) fn create_csv(path: &Path) -> Result<csv::Writer<File>, ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    Ok(csv::Writer::from_writer(file))
}

pub(crate) fn csv_err(path: &Path) -> impl Fn(csv::Error) -> ReportError + '_ {
    move |source| ReportError::Csv {
        path: path.display().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Backtest results
// ---------------------------------------------------------------------------

pub fn results_header(pick_columns: usize) -> Vec<String> {
    let mut header = vec!["date".to_string()];
    header.extend((1..=pick_columns).map(|i| format!("pick{i}_id")));
    header.extend((1..=pick_columns).map(|i| format!("pick{i}_name")));
    header.push("correct".into());
    header.push("total".into());
    header
}

/// One row per evaluated day. Every row has the same width; picks a day did
/// not produce are written as empty fields.
pub fn write_results<W: Write>(
    writer: &mut csv::Writer<W>,
    results: &[BacktestDayResult],
    pick_columns: usize,
) -> Result<(), csv::Error> {
    writer.write_record(results_header(pick_columns))?;
    for day in results {
        let mut row = vec![day.date.format("%Y-%m-%d").to_string()];
        row.extend((0..pick_columns).map(|i| {
            day.picks
                .get(i)
                .map(|p| p.player_id.to_string())
                .unwrap_or_default()
        }));
        row.extend((0..pick_columns).map(|i| {
            day.picks
                .get(i)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        }));
        row.push(day.correct_count.to_string());
        row.push(day.total_count.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_results(
    dir: &Path,
    results: &[BacktestDayResult],
    top_n: usize,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(RESULTS_FILE);
    let mut writer = create_csv(&path)?;
    write_results(&mut writer, results, top_n.max(MIN_PICK_COLUMNS)).map_err(csv_err(&path))?;
    info!("wrote {} result rows to {}", results.len(), path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

pub fn write_summary<W: Write>(
    writer: &mut csv::Writer<W>,
    summary: &BacktestSummary,
) -> Result<(), csv::Error> {
    writer.write_record(["metric", "value"])?;
    writer.write_record(["days_evaluated", &summary.days_evaluated.to_string()])?;
    writer.write_record(["total_picks", &summary.total_picks.to_string()])?;
    writer.write_record(["total_correct", &summary.total_correct.to_string()])?;
    writer.write_record(["overall_accuracy", &format_ratio(summary.accuracy())])?;
    for position in &summary.by_position {
        writer.write_record([
            format!("{}_accuracy", position.label),
            format_ratio(position.accuracy()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summary(dir: &Path, summary: &BacktestSummary) -> Result<PathBuf, ReportError> {
    let path = dir.join(SUMMARY_FILE);
    let mut writer = create_csv(&path)?;
    write_summary(&mut writer, summary).map_err(csv_err(&path))?;
    Ok(path)
}

pub(crate) fn format_ratio(value: f64) -> String {
    format!("{value:.4}")
}

// ---------------------------------------------------------------------------
// Ranking audit
// ---------------------------------------------------------------------------

const RANKING_HEADER: [&str; 15] = [
    "rank",
    "player_id",
    "name",
    "team",
    "position",
    "goals",
    "recent_goals",
    "goals_per_game",
    "points",
    "shots",
    "shot_pct",
    "plus_minus",
    "toi",
    "games_played",
    "injured",
];

/// Full best-first ordering of one candidate set.
pub fn write_rankings<W: Write>(
    writer: &mut csv::Writer<W>,
    ranked: &[PlayerSeasonStats],
) -> Result<(), csv::Error> {
    writer.write_record(RANKING_HEADER)?;
    for (i, p) in ranked.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            p.player_id.to_string(),
            p.full_name.clone(),
            p.team_abbrev.clone(),
            p.position.map(|pos| pos.to_string()).unwrap_or_default(),
            p.goals.to_string(),
            p.recent_goals.to_string(),
            p.goals_per_game.map(|g| format!("{g:.2}")).unwrap_or_default(),
            p.points.to_string(),
            p.shots.to_string(),
            format!("{:.3}", p.shot_percentage),
            p.plus_minus.to_string(),
            p.time_on_ice_display(),
            p.games_played.to_string(),
            p.injured.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_rankings(path: &Path, ranked: &[PlayerSeasonStats]) -> Result<(), ReportError> {
    let mut writer = create_csv(path)?;
    write_rankings(&mut writer, ranked).map_err(csv_err(path))
}

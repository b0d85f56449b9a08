// Evaluation of the live workflow's pick history: how often each contest
// slot's pick actually scored.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::backtest::ratio;
use crate::report::{create_csv, csv_err, format_ratio, ReportError};

pub const SUMMARY_FILE: &str = "evaluation_summary.csv";
pub const DETAILS_FILE: &str = "evaluation_details.csv";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read pick history {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid pick history {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickHistory {
    #[serde(default)]
    pub history: Vec<HistoryDay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDay {
    #[serde(default)]
    pub contest_date: Option<String>,
    #[serde(default)]
    pub picks: Vec<HistoryPick>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPick {
    #[serde(default, deserialize_with = "optional_id")]
    pub set_id: Option<String>,
    /// Absent until the day has been graded.
    #[serde(default)]
    pub correct: Option<bool>,
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayEvaluation {
    pub date: String,
    pub total: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub days: Vec<DayEvaluation>,
    /// Set id -> (correct, total), ordered by set id.
    pub per_set: BTreeMap<String, (usize, usize)>,
}

impl Evaluation {
    pub fn total_picks(&self) -> usize {
        self.days.iter().map(|d| d.total).sum()
    }

    pub fn total_correct(&self) -> usize {
        self.days.iter().map(|d| d.correct).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.total_correct(), self.total_picks())
    }
}

/// Grade every day that has picks with a `correct` flag. Picks without a
/// set id are ignored.
pub fn evaluate(history: &PickHistory) -> Evaluation {
    let mut eval = Evaluation::default();
    for day in &history.history {
        if day.picks.is_empty() || day.picks.iter().all(|p| p.correct.is_none()) {
            continue;
        }
        let mut total = 0;
        let mut correct = 0;
        for pick in &day.picks {
            let Some(set_id) = &pick.set_id else {
                continue;
            };
            let hit = pick.correct.unwrap_or(false);
            let entry = eval.per_set.entry(set_id.clone()).or_insert((0, 0));
            entry.1 += 1;
            total += 1;
            if hit {
                entry.0 += 1;
                correct += 1;
            }
        }
        eval.days.push(DayEvaluation {
            date: day.contest_date.clone().unwrap_or_default(),
            total,
            correct,
        });
    }
    eval
}

pub fn load_history(path: &Path) -> Result<PickHistory, HistoryError> {
    let text = std::fs::read_to_string(path).map_err(|source| HistoryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| HistoryError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// `metric,value` rows: totals, overall accuracy, then per-set accuracy
/// ordered by set id.
pub fn write_summary<W: Write>(writer: &mut csv::Writer<W>, eval: &Evaluation) -> Result<(), csv::Error> {
    writer.write_record(["metric", "value"])?;
    writer.write_record(["days_evaluated", &eval.days.len().to_string()])?;
    writer.write_record(["total_picks", &eval.total_picks().to_string()])?;
    writer.write_record(["total_correct", &eval.total_correct().to_string()])?;
    writer.write_record(["overall_accuracy", &format_ratio(eval.accuracy())])?;
    for (set_id, (correct, total)) in &eval.per_set {
        writer.write_record([
            format!("set_{set_id}_accuracy"),
            format_ratio(ratio(*correct, *total)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_details<W: Write>(writer: &mut csv::Writer<W>, eval: &Evaluation) -> Result<(), csv::Error> {
    writer.write_record(["date", "total_picks", "correct"])?;
    for day in &eval.days {
        writer.write_record([day.date.clone(), day.total.to_string(), day.correct.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the summary and per-day files into `dir`.
pub fn save_evaluation(dir: &Path, eval: &Evaluation) -> Result<(PathBuf, PathBuf), HistoryError> {
    let summary_path = dir.join(SUMMARY_FILE);
    let mut summary = create_csv(&summary_path)?;
    write_summary(&mut summary, eval).map_err(csv_err(&summary_path))?;

    let details_path = dir.join(DETAILS_FILE);
    let mut details = create_csv(&details_path)?;
    write_details(&mut details, eval).map_err(csv_err(&details_path))?;

    info!(
        "evaluated {} days of pick history into {}",
        eval.days.len(),
        dir.display()
    );
    Ok((summary_path, details_path))
}

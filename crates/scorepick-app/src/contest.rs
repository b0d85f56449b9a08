// Saved contest snapshot: the day's games and the three player sets the
// contest offered, as captured by the live workflow.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use scorepick_core::names::{full_name, jersey_from_json};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid snapshot {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestSnapshot {
    #[serde(default)]
    pub contest_date: Option<String>,
    #[serde(default)]
    pub games: Vec<ContestGame>,
    #[serde(default)]
    pub sets: Vec<PlayerSet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestGame {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub home_team: ContestTeam,
    pub away_team: ContestTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestTeam {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One of the contest's selection slots.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSet {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub players: Vec<ContestPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestPlayer {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Jersey number as the contest reports it: number, string or absent.
    #[serde(default)]
    pub number: Option<Value>,
    pub team: ContestTeamRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestTeamRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

impl ContestPlayer {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn jersey_number(&self) -> Option<u32> {
        self.number.as_ref().and_then(jersey_from_json)
    }
}

impl ContestSnapshot {
    /// Contest team id -> display name, from both sides of every game.
    pub fn team_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::new();
        for game in &self.games {
            for team in [&game.home_team, &game.away_team] {
                if !team.name.is_empty() {
                    names.insert(team.id.clone(), team.name.clone());
                }
            }
        }
        names
    }

    /// Calendar date of the contest. Accepts a bare date or a timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.contest_date.as_deref()?.trim();
        let day = raw.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

pub fn load_snapshot(path: &Path) -> Result<ContestSnapshot, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_snapshot(&text).map_err(|source| SnapshotError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse_snapshot(text: &str) -> Result<ContestSnapshot, serde_json::Error> {
    serde_json::from_str(text)
}

/// Contest ids show up both as JSON numbers and as strings.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

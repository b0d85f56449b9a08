// Canonical game, appearance and season-stat records.
//
// Everything here is produced by the gateway/aggregator from raw league
// payloads and consumed read-only by the ranking engine and the backtester.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::names::normalize_name;

/// League player identifier.
pub type PlayerId = u64;

/// League game identifier.
pub type GameId = u64;

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

/// Coarse lifecycle of a scheduled game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Future,
    Live,
    Final,
}

impl GameState {
    /// Map a league `gameState` code onto the coarse lifecycle.
    ///
    /// Pre-game and unrecognized codes count as `Future`: no skater stats
    /// exist yet, so the game is skipped.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "LIVE" | "CRIT" => GameState::Live,
            "FINAL" | "OFF" => GameState::Final,
            _ => GameState::Future,
        }
    }

    pub fn is_future(&self) -> bool {
        matches!(self, GameState::Future)
    }
}

/// One game from a schedule query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub state: GameState,
    pub home_abbrev: String,
    pub away_abbrev: String,
}

// ---------------------------------------------------------------------------
// Positions and appearances
// ---------------------------------------------------------------------------

/// Skater/goalie position as reported in boxscores and rosters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defense,
    Goalie,
}

impl Position {
    /// Parse a league position code ("C", "L", "LW", "R", "RW", "D", "G").
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "C" => Some(Position::Center),
            "L" | "LW" => Some(Position::LeftWing),
            "R" | "RW" => Some(Position::RightWing),
            "D" => Some(Position::Defense),
            "G" => Some(Position::Goalie),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "L",
            Position::RightWing => "R",
            Position::Defense => "D",
            Position::Goalie => "G",
        }
    }

    pub fn is_skater(&self) -> bool {
        !matches!(self, Position::Goalie)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A skater's line in one game's boxscore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameAppearance {
    pub player_id: PlayerId,
    pub full_name: String,
    pub jersey_number: Option<u32>,
    pub position: Position,
    pub team_abbrev: String,
    pub goals_in_game: u32,
}

/// Normalized boxscore: skaters only, both sides flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Boxscore {
    pub game_id: GameId,
    pub game_date: Option<NaiveDate>,
    pub state: GameState,
    pub appearances: Vec<PlayerGameAppearance>,
}

// ---------------------------------------------------------------------------
// Rosters and teams
// ---------------------------------------------------------------------------

/// One player on a team's season roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub full_name: String,
    pub jersey_number: Option<u32>,
    pub position: Option<Position>,
    pub team_abbrev: String,
}

/// A league team as listed by the stats API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueTeam {
    pub full_name: String,
    pub abbrev: String,
}

/// Identity carried from an appearance or a reconciled roster entry into
/// the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
    pub full_name: String,
    pub jersey_number: Option<u32>,
    pub position: Option<Position>,
    pub team_abbrev: String,
}

impl From<&PlayerGameAppearance> for PlayerIdentity {
    fn from(a: &PlayerGameAppearance) -> Self {
        PlayerIdentity {
            player_id: a.player_id,
            full_name: a.full_name.clone(),
            jersey_number: a.jersey_number,
            position: Some(a.position),
            team_abbrev: a.team_abbrev.clone(),
        }
    }
}

impl From<&RosterEntry> for PlayerIdentity {
    fn from(r: &RosterEntry) -> Self {
        PlayerIdentity {
            player_id: r.player_id,
            full_name: r.full_name.clone(),
            jersey_number: r.jersey_number,
            position: r.position,
            team_abbrev: r.team_abbrev.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Injury report
// ---------------------------------------------------------------------------

/// Names of currently injured players, stored as normalized keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjuryReport {
    names: HashSet<String>,
}

impl InjuryReport {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        InjuryReport {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn is_injured(&self, full_name: &str) -> bool {
        self.names.contains(&normalize_name(full_name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Season stats
// ---------------------------------------------------------------------------

/// Season-to-date performance signature for one player.
///
/// Built once per player per evaluation by the aggregator and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    pub player_id: PlayerId,
    pub full_name: String,
    pub team_abbrev: String,
    pub position: Option<Position>,
    pub season: u32,
    pub goals: u32,
    pub points: u32,
    pub shots: u32,
    pub shot_percentage: f64,
    pub plus_minus: i32,
    pub time_on_ice: Duration,
    pub games_played: u32,
    /// `goals / games_played` rounded to two decimals; `None` when no games
    /// have been played.
    pub goals_per_game: Option<f64>,
    /// Goals across the trailing five games played.
    pub recent_goals: u32,
    pub injured: bool,
}

impl PlayerSeasonStats {
    /// Average time on ice formatted as `MM:SS`.
    pub fn time_on_ice_display(&self) -> String {
        let secs = self.time_on_ice.as_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Goals per game, defined only when at least one game was played.
pub fn goals_per_game(goals: u32, games_played: u32) -> Option<f64> {
    if games_played == 0 {
        None
    } else {
        Some(round2(goals as f64 / games_played as f64))
    }
}

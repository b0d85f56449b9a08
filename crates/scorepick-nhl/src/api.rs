// Raw response shapes of the league web/stats APIs and the injury report,
// plus their normalization into the canonical model.
//
// Every field the code does not strictly need is optional so that a
// partially published payload still deserializes; missing pieces are
// handled where they are used.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use scorepick_core::names::full_name;
use scorepick_core::player::{
    Boxscore, GameId, GameState, InjuryReport, LeagueTeam, PlayerGameAppearance, PlayerId,
    Position, RosterEntry, ScheduledGame,
};

/// `{"default": "..."}` wrapper used for localized strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub default: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamRef {
    #[serde(default)]
    pub abbrev: String,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[serde(default)]
    pub game_week: Vec<ScheduleDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDay {
    pub date: String,
    #[serde(default)]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub id: GameId,
    #[serde(default)]
    pub game_state: String,
    #[serde(default)]
    pub home_team: TeamRef,
    #[serde(default)]
    pub away_team: TeamRef,
}

/// Flatten every dated entry of a schedule response. Entries with an
/// unparseable date are dropped.
pub fn normalize_schedule(raw: ScheduleResponse) -> Vec<ScheduledGame> {
    let mut games = Vec::new();
    for day in raw.game_week {
        let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") else {
            warn!("skipping schedule entry with malformed date '{}'", day.date);
            continue;
        };
        for game in day.games {
            games.push(ScheduledGame {
                game_id: game.id,
                date,
                state: GameState::from_code(&game.game_state),
                home_abbrev: game.home_team.abbrev,
                away_abbrev: game.away_team.abbrev,
            });
        }
    }
    games
}

// ---------------------------------------------------------------------------
// Boxscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxscoreResponse {
    pub id: GameId,
    #[serde(default)]
    pub game_date: Option<String>,
    #[serde(default)]
    pub game_state: String,
    #[serde(default)]
    pub home_team: TeamRef,
    #[serde(default)]
    pub away_team: TeamRef,
    #[serde(default)]
    pub player_by_game_stats: Option<PlayerByGameStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerByGameStats {
    #[serde(default)]
    pub home_team: Option<TeamGameStats>,
    #[serde(default)]
    pub away_team: Option<TeamGameStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamGameStats {
    #[serde(default)]
    pub forwards: Vec<SkaterLine>,
    #[serde(default)]
    pub defense: Vec<SkaterLine>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkaterLine {
    pub player_id: PlayerId,
    #[serde(default)]
    pub sweater_number: Option<u32>,
    #[serde(default)]
    pub name: LocalizedName,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub goals: Option<u32>,
}

/// Flatten both sides' forwards and defense into appearances. Goalies are
/// never read. A side without published stats contributes nothing.
pub fn normalize_boxscore(raw: BoxscoreResponse) -> Boxscore {
    let stats = raw.player_by_game_stats.unwrap_or_default();
    let mut appearances = Vec::new();
    let sides = [
        ("awayTeam", &raw.away_team.abbrev, stats.away_team),
        ("homeTeam", &raw.home_team.abbrev, stats.home_team),
    ];
    for (side, abbrev, team_stats) in sides {
        let Some(team_stats) = team_stats else {
            warn!(game_id = raw.id, "no player stats published for {side}");
            continue;
        };
        let groups = [
            (team_stats.forwards, Position::Center),
            (team_stats.defense, Position::Defense),
        ];
        for (lines, fallback) in groups {
            for line in lines {
                appearances.push(PlayerGameAppearance {
                    player_id: line.player_id,
                    full_name: line.name.default.trim().to_string(),
                    jersey_number: line.sweater_number,
                    position: Position::from_code(&line.position).unwrap_or(fallback),
                    team_abbrev: abbrev.clone(),
                    goals_in_game: line.goals.unwrap_or(0),
                });
            }
        }
    }

    Boxscore {
        game_id: raw.id,
        game_date: raw
            .game_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        state: GameState::from_code(&raw.game_state),
        appearances,
    }
}

// ---------------------------------------------------------------------------
// Player landing
// ---------------------------------------------------------------------------

/// Player landing page: season totals across every league played in, plus
/// the trailing five games.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLanding {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub first_name: LocalizedName,
    #[serde(default)]
    pub last_name: LocalizedName,
    #[serde(default)]
    pub season_totals: Vec<SeasonTotal>,
    #[serde(default, rename = "last5Games")]
    pub last_5_games: Vec<RecentGame>,
}

impl PlayerLanding {
    pub fn display_name(&self) -> String {
        full_name(&self.first_name.default, &self.last_name.default)
    }
}

/// One season row. Rows are listed oldest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonTotal {
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub league_abbrev: String,
    #[serde(default)]
    pub game_type_id: Option<u8>,
    #[serde(default)]
    pub games_played: Option<u32>,
    #[serde(default)]
    pub goals: Option<u32>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub shots: Option<u32>,
    #[serde(default)]
    pub shooting_pctg: Option<f64>,
    #[serde(default)]
    pub plus_minus: Option<i32>,
    #[serde(default)]
    pub avg_toi: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGame {
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub goals: Option<u32>,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub forwards: Vec<RosterPlayer>,
    #[serde(default)]
    pub defensemen: Vec<RosterPlayer>,
    #[serde(default)]
    pub goalies: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub id: PlayerId,
    #[serde(default)]
    pub first_name: LocalizedName,
    #[serde(default)]
    pub last_name: LocalizedName,
    #[serde(default)]
    pub sweater_number: Option<u32>,
    #[serde(default)]
    pub position_code: String,
}

pub fn normalize_roster(raw: RosterResponse, team_abbrev: &str) -> Vec<RosterEntry> {
    raw.forwards
        .into_iter()
        .chain(raw.defensemen)
        .chain(raw.goalies)
        .map(|p| RosterEntry {
            player_id: p.id,
            full_name: full_name(&p.first_name.default, &p.last_name.default),
            jersey_number: p.sweater_number,
            position: Position::from_code(&p.position_code),
            team_abbrev: team_abbrev.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamsResponse {
    #[serde(default)]
    pub data: Vec<TeamRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRow {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub tri_code: String,
}

pub fn normalize_teams(raw: TeamsResponse) -> Vec<LeagueTeam> {
    raw.data
        .into_iter()
        .filter(|t| !t.tri_code.is_empty())
        .map(|t| LeagueTeam {
            full_name: t.full_name,
            abbrev: t.tri_code,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Injury report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InjuryRow {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

pub fn normalize_injuries(rows: Vec<InjuryRow>) -> InjuryReport {
    InjuryReport::from_names(rows.iter().map(|r| full_name(&r.firstname, &r.lastname)))
}

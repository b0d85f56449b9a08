// In-memory league data for orchestrator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use scorepick_core::player::{
    Boxscore, GameId, GameState, InjuryReport, LeagueTeam, PlayerGameAppearance, PlayerId,
    Position, RosterEntry, ScheduledGame,
};
use scorepick_core::season::SeasonId;
use scorepick_nhl::api::{PlayerLanding, RecentGame, SeasonTotal};
use scorepick_nhl::DataSource;

pub const SEASON_CODE: u32 = 20242025;

pub fn season() -> SeasonId {
    SeasonId::starting_in(2024)
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Records every call so tests can assert on what was (not) fetched.
#[derive(Default)]
pub struct FakeSource {
    pub schedules: HashMap<NaiveDate, Vec<ScheduledGame>>,
    pub boxscores: HashMap<GameId, Boxscore>,
    pub landings: HashMap<PlayerId, PlayerLanding>,
    pub rosters: HashMap<String, Vec<RosterEntry>>,
    pub teams: Vec<LeagueTeam>,
    pub injuries: InjuryReport,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn add_game(&mut self, game: ScheduledGame, boxscore: Option<Boxscore>) {
        self.schedules.entry(game.date).or_default().push(game.clone());
        if let Some(b) = boxscore {
            self.boxscores.insert(game.game_id, b);
        }
    }

    pub fn add_landing(&mut self, player_id: PlayerId, landing: PlayerLanding) {
        self.landings.insert(player_id, landing);
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn schedule_for_date(&self, date: NaiveDate) -> Vec<ScheduledGame> {
        self.log(format!("schedule {date}"));
        self.schedules.get(&date).cloned().unwrap_or_default()
    }

    async fn boxscore(&self, game_id: GameId) -> Option<Boxscore> {
        self.log(format!("boxscore {game_id}"));
        self.boxscores.get(&game_id).cloned()
    }

    async fn player_landing(&self, player_id: PlayerId) -> Option<PlayerLanding> {
        self.log(format!("landing {player_id}"));
        self.landings.get(&player_id).cloned()
    }

    async fn team_roster(&self, team_abbrev: &str, _season: SeasonId) -> Vec<RosterEntry> {
        self.log(format!("roster {team_abbrev}"));
        self.rosters.get(team_abbrev).cloned().unwrap_or_default()
    }

    async fn teams(&self) -> Vec<LeagueTeam> {
        self.log("teams".into());
        self.teams.clone()
    }

    async fn injury_report(&self) -> &InjuryReport {
        &self.injuries
    }
}

// ---- builders ----

pub fn game(id: GameId, date: &str, state: GameState) -> ScheduledGame {
    ScheduledGame {
        game_id: id,
        date: d(date),
        state,
        home_abbrev: "MTL".into(),
        away_abbrev: "TOR".into(),
    }
}

pub fn skater(id: PlayerId, name: &str, position: Position, goals: u32) -> PlayerGameAppearance {
    PlayerGameAppearance {
        player_id: id,
        full_name: name.into(),
        jersey_number: None,
        position,
        team_abbrev: "MTL".into(),
        goals_in_game: goals,
    }
}

pub fn boxscore(id: GameId, appearances: Vec<PlayerGameAppearance>) -> Boxscore {
    Boxscore {
        game_id: id,
        game_date: None,
        state: GameState::Final,
        appearances,
    }
}

/// Landing with an active-season NHL line.
pub fn landing(goals: u32, games_played: u32, last5: &[u32]) -> PlayerLanding {
    landing_for_season(SEASON_CODE, goals, games_played, last5)
}

pub fn landing_for_season(season: u32, goals: u32, games_played: u32, last5: &[u32]) -> PlayerLanding {
    PlayerLanding {
        season_totals: vec![SeasonTotal {
            season: Some(season),
            league_abbrev: "NHL".into(),
            game_type_id: Some(2),
            games_played: Some(games_played),
            goals: Some(goals),
            points: Some(goals * 2),
            shots: Some(goals * 8),
            shooting_pctg: Some(0.125),
            plus_minus: Some(0),
            avg_toi: Some("17:00".into()),
        }],
        last_5_games: last5
            .iter()
            .map(|g| RecentGame {
                game_id: None,
                goals: Some(*g),
            })
            .collect(),
        ..PlayerLanding::default()
    }
}

pub fn roster_entry(id: PlayerId, name: &str, jersey: u32, team: &str) -> RosterEntry {
    RosterEntry {
        player_id: id,
        full_name: name.into(),
        jersey_number: Some(jersey),
        position: Some(Position::Center),
        team_abbrev: team.into(),
    }
}

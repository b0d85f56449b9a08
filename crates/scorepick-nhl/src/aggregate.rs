// Season-stat aggregation from a player landing payload.

use std::time::Duration;

use thiserror::Error;

use scorepick_core::player::{
    goals_per_game, InjuryReport, PlayerId, PlayerIdentity, PlayerSeasonStats,
};
use scorepick_core::season::SeasonId;

use crate::api::{PlayerLanding, RecentGame, SeasonTotal};

/// League abbreviation of the top professional competition.
pub const TOP_LEAGUE: &str = "NHL";

/// Games counted by the recent-form window.
pub const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("no {season} NHL season totals for player {player_id}")]
    SeasonNotFound { player_id: PlayerId, season: SeasonId },

    #[error("{season} season totals for player {player_id} lack `{field}`")]
    MissingField {
        player_id: PlayerId,
        season: SeasonId,
        field: &'static str,
    },

    #[error("player {player_id} has malformed average time on ice '{value}'")]
    MalformedTimeOnIce { player_id: PlayerId, value: String },
}

/// Find the active-season top-league row.
///
/// Rows are assumed oldest-first, so they are scanned from the end and the
/// scan stops at the first row of a different season. An out-of-order
/// payload can therefore hide the right row; that assumption is not
/// checked.
pub fn find_season_totals(totals: &[SeasonTotal], season: SeasonId) -> Option<&SeasonTotal> {
    let code = season.code();
    for row in totals.iter().rev() {
        if row.season != Some(code) {
            break;
        }
        if row.league_abbrev.eq_ignore_ascii_case(TOP_LEAGUE) {
            return Some(row);
        }
    }
    None
}

/// Sum of goals across the trailing window of games played.
pub fn recent_goals(games: &[RecentGame]) -> u32 {
    games
        .iter()
        .take(RECENT_WINDOW)
        .map(|g| g.goals.unwrap_or(0))
        .sum()
}

/// Parse an `MM:SS` average time on ice.
pub fn parse_time_on_ice(value: &str) -> Option<Duration> {
    let (minutes, seconds) = value.trim().split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;
    let seconds: u64 = seconds.trim().parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(Duration::from_secs(minutes * 60 + seconds))
}

/// Build the season-stat record for one player.
///
/// Fails rather than fabricating zeros when the active season's row is
/// missing or lacks goals/games played; the caller drops the player.
pub fn aggregate(
    identity: &PlayerIdentity,
    landing: &PlayerLanding,
    season: SeasonId,
    injuries: &InjuryReport,
) -> Result<PlayerSeasonStats, AggregateError> {
    let player_id = identity.player_id;
    let row = find_season_totals(&landing.season_totals, season)
        .ok_or(AggregateError::SeasonNotFound { player_id, season })?;

    let missing = |field| AggregateError::MissingField {
        player_id,
        season,
        field,
    };
    let goals = row.goals.ok_or_else(|| missing("goals"))?;
    let games_played = row.games_played.ok_or_else(|| missing("gamesPlayed"))?;

    let time_on_ice = match row.avg_toi.as_deref() {
        None => Duration::ZERO,
        Some(raw) => parse_time_on_ice(raw).ok_or_else(|| AggregateError::MalformedTimeOnIce {
            player_id,
            value: raw.to_string(),
        })?,
    };

    let full_name = if identity.full_name.trim().is_empty() {
        landing.display_name()
    } else {
        identity.full_name.clone()
    };
    let injured = injuries.is_injured(&full_name);

    Ok(PlayerSeasonStats {
        player_id,
        full_name,
        team_abbrev: identity.team_abbrev.clone(),
        position: identity.position,
        season: season.code(),
        goals,
        points: row.points.unwrap_or(0),
        shots: row.shots.unwrap_or(0),
        shot_percentage: row.shooting_pctg.unwrap_or(0.0),
        plus_minus: row.plus_minus.unwrap_or(0),
        time_on_ice,
        games_played,
        goals_per_game: goals_per_game(goals, games_played),
        recent_goals: recent_goals(&landing.last_5_games),
        injured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorepick_core::player::Position;

    fn season() -> SeasonId {
        SeasonId::starting_in(2024)
    }

    fn row(season: u32, league: &str, goals: Option<u32>, gp: Option<u32>) -> SeasonTotal {
        SeasonTotal {
            season: Some(season),
            league_abbrev: league.into(),
            game_type_id: Some(2),
            games_played: gp,
            goals,
            points: goals.map(|g| g * 2),
            shots: Some(100),
            shooting_pctg: Some(0.125),
            plus_minus: Some(-3),
            avg_toi: Some("18:32".into()),
        }
    }

    fn recent(goals: &[u32]) -> Vec<RecentGame> {
        goals
            .iter()
            .map(|g| RecentGame {
                game_id: None,
                goals: Some(*g),
            })
            .collect()
    }

    fn identity() -> PlayerIdentity {
        PlayerIdentity {
            player_id: 8480018,
            full_name: "Nick Suzuki".into(),
            jersey_number: Some(14),
            position: Some(Position::Center),
            team_abbrev: "MTL".into(),
        }
    }

    fn landing(totals: Vec<SeasonTotal>, last5: &[u32]) -> PlayerLanding {
        PlayerLanding {
            season_totals: totals,
            last_5_games: recent(last5),
            ..PlayerLanding::default()
        }
    }

    #[test]
    fn picks_latest_top_league_row_of_active_season() {
        let totals = vec![
            row(20232024, "NHL", Some(33), Some(82)),
            row(20242025, "AHL", Some(4), Some(6)),
            row(20242025, "NHL", Some(20), Some(40)),
        ];
        let found = find_season_totals(&totals, season()).unwrap();
        assert_eq!(found.goals, Some(20));
    }

    #[test]
    fn scan_stops_at_first_other_season() {
        // Active-season NHL row hidden behind an older row at the end.
        let totals = vec![
            row(20242025, "NHL", Some(20), Some(40)),
            row(20232024, "NHL", Some(33), Some(82)),
        ];
        assert!(find_season_totals(&totals, season()).is_none());
    }

    #[test]
    fn no_matching_row_is_an_error_not_zeros() {
        let landing = landing(vec![row(20232024, "NHL", Some(33), Some(82))], &[1, 0]);
        let err = aggregate(&identity(), &landing, season(), &InjuryReport::default()).unwrap_err();
        assert_eq!(
            err,
            AggregateError::SeasonNotFound {
                player_id: 8480018,
                season: season()
            }
        );
    }

    #[test]
    fn builds_full_record() {
        let landing = landing(vec![row(20242025, "NHL", Some(20), Some(40))], &[1, 0, 2, 0, 1]);
        let injuries = InjuryReport::from_names(["Nick Suzuki"]);
        let stats = aggregate(&identity(), &landing, season(), &injuries).unwrap();
        assert_eq!(stats.goals, 20);
        assert_eq!(stats.points, 40);
        assert_eq!(stats.games_played, 40);
        assert_eq!(stats.goals_per_game, Some(0.5));
        assert_eq!(stats.recent_goals, 4);
        assert_eq!(stats.plus_minus, -3);
        assert_eq!(stats.time_on_ice, Duration::from_secs(18 * 60 + 32));
        assert_eq!(stats.season, 20242025);
        assert_eq!(stats.team_abbrev, "MTL");
        assert!(stats.injured);
    }

    #[test]
    fn zero_games_played_leaves_rate_undefined() {
        let landing = landing(vec![row(20242025, "NHL", Some(0), Some(0))], &[]);
        let stats = aggregate(&identity(), &landing, season(), &InjuryReport::default()).unwrap();
        assert_eq!(stats.goals_per_game, None);
        assert_eq!(stats.recent_goals, 0);
        assert!(!stats.injured);
    }

    #[test]
    fn missing_goals_is_an_error() {
        let landing = landing(vec![row(20242025, "NHL", None, Some(10))], &[]);
        let err = aggregate(&identity(), &landing, season(), &InjuryReport::default()).unwrap_err();
        assert!(matches!(err, AggregateError::MissingField { field: "goals", .. }));
    }

    #[test]
    fn malformed_toi_is_an_error() {
        let mut bad = row(20242025, "NHL", Some(3), Some(10));
        bad.avg_toi = Some("eighteen".into());
        let err = aggregate(&identity(), &landing(vec![bad], &[]), season(), &InjuryReport::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::MalformedTimeOnIce { .. }));
    }

    #[test]
    fn recent_window_is_capped_at_five_games() {
        assert_eq!(recent_goals(&recent(&[1, 1, 1, 1, 1, 5])), 5);
        assert_eq!(recent_goals(&[]), 0);
    }

    #[test]
    fn time_on_ice_parsing() {
        assert_eq!(parse_time_on_ice("21:07"), Some(Duration::from_secs(21 * 60 + 7)));
        assert_eq!(parse_time_on_ice("9:00"), Some(Duration::from_secs(540)));
        assert_eq!(parse_time_on_ice("9:75"), None);
        assert_eq!(parse_time_on_ice("abc"), None);
    }

    #[test]
    fn empty_identity_name_falls_back_to_landing_name() {
        let mut l = landing(vec![row(20242025, "NHL", Some(1), Some(2))], &[]);
        l.first_name.default = "Cole".into();
        l.last_name.default = "Caufield".into();
        let mut id = identity();
        id.full_name = String::new();
        let stats = aggregate(&id, &l, season(), &InjuryReport::default()).unwrap();
        assert_eq!(stats.full_name, "Cole Caufield");
    }
}

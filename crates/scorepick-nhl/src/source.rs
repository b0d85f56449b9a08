// The gateway seam the backtester is written against.

use async_trait::async_trait;
use chrono::NaiveDate;

use scorepick_core::player::{
    Boxscore, GameId, InjuryReport, LeagueTeam, PlayerId, RosterEntry, ScheduledGame,
};
use scorepick_core::season::SeasonId;

use crate::api::PlayerLanding;

/// Read-only access to league data.
///
/// Every operation is idempotent and infallible from the caller's point of
/// view: unavailable data comes back empty (`Vec::new()` / `None`), which
/// callers must read as "unknown, skip", never as "nothing happened".
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Games listed by the schedule query for `date`, each tagged with its
    /// own date (the league returns the surrounding week).
    async fn schedule_for_date(&self, date: NaiveDate) -> Vec<ScheduledGame>;

    /// Skater lines for one game.
    async fn boxscore(&self, game_id: GameId) -> Option<Boxscore>;

    /// Season totals and recent games for one player.
    async fn player_landing(&self, player_id: PlayerId) -> Option<PlayerLanding>;

    /// A team's roster for a season.
    async fn team_roster(&self, team_abbrev: &str, season: SeasonId) -> Vec<RosterEntry>;

    /// Every league team with its abbreviation.
    async fn teams(&self) -> Vec<LeagueTeam>;

    /// Injured player names, fetched at most once per source instance.
    async fn injury_report(&self) -> &InjuryReport;
}

// Slot-partitioned selection: one pick per contest-provided player set.
//
// Unlike the pooled backtest, candidates arrive as free-text contest
// entries and must be reconciled to league roster entries before their
// season stats can be fetched.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use scorepick_core::player::{PlayerIdentity, PlayerSeasonStats, RosterEntry};
use scorepick_core::ranking::rank;
use scorepick_core::reconcile::{
    match_roster_entry, resolve_jersey_number, OverrideTables, TeamDirectory,
};
use scorepick_core::season::SeasonId;
use scorepick_nhl::aggregate::aggregate;
use scorepick_nhl::DataSource;

use crate::backtest::{BacktestDayResult, Backtester};
use crate::contest::{ContestPlayer, ContestSnapshot, PlayerSet};

/// Ranking for one contest slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRanking {
    pub set_id: String,
    /// Best first.
    pub ranked: Vec<PlayerSeasonStats>,
    /// Contest entries that could not be reconciled or aggregated.
    pub excluded: usize,
}

impl SlotRanking {
    /// The slot's pick, if any candidate survived reconciliation.
    pub fn pick(&self) -> Option<&PlayerSeasonStats> {
        self.ranked.first()
    }
}

pub struct SlotPicker<'a, S: DataSource + ?Sized> {
    source: &'a S,
    season: SeasonId,
    overrides: &'a OverrideTables,
}

impl<'a, S: DataSource + ?Sized> SlotPicker<'a, S> {
    pub fn new(source: &'a S, season: SeasonId, overrides: &'a OverrideTables) -> Self {
        SlotPicker {
            source,
            season,
            overrides,
        }
    }

    /// Rank every set in the snapshot, in snapshot order.
    pub async fn rank_sets(&self, snapshot: &ContestSnapshot) -> Vec<SlotRanking> {
        let teams = TeamDirectory::new(snapshot.team_names(), self.source.teams().await);
        let mut rosters: HashMap<String, Vec<RosterEntry>> = HashMap::new();
        let mut rankings = Vec::with_capacity(snapshot.sets.len());
        for set in &snapshot.sets {
            let ranking = self.rank_set(set, &teams, &mut rosters).await;
            match ranking.pick() {
                Some(top) => info!(
                    set_id = %ranking.set_id,
                    candidates = ranking.ranked.len(),
                    excluded = ranking.excluded,
                    "top pick {} ({} goals)",
                    top.full_name,
                    top.goals
                ),
                None => warn!(set_id = %ranking.set_id, "no candidate could be ranked; slot has no pick"),
            }
            rankings.push(ranking);
        }
        rankings
    }

    async fn rank_set(
        &self,
        set: &PlayerSet,
        teams: &TeamDirectory,
        rosters: &mut HashMap<String, Vec<RosterEntry>>,
    ) -> SlotRanking {
        let injuries = self.source.injury_report().await;
        let mut candidates = Vec::with_capacity(set.players.len());
        let mut excluded = 0;
        for player in &set.players {
            let Some(identity) = self.reconcile(set, player, teams, rosters).await else {
                excluded += 1;
                continue;
            };
            let player_id = identity.player_id;
            let Some(landing) = self.source.player_landing(player_id).await else {
                warn!(set_id = %set.id, player_id, "player landing unavailable; candidate excluded");
                excluded += 1;
                continue;
            };
            match aggregate(&identity, &landing, self.season, injuries) {
                Ok(stats) => candidates.push(stats),
                Err(e) => {
                    warn!(set_id = %set.id, player_id, "candidate excluded: {e}");
                    excluded += 1;
                }
            }
        }

        SlotRanking {
            set_id: set.id.clone(),
            ranked: rank(&candidates),
            excluded,
        }
    }

    /// Map a contest entry onto a league roster entry.
    async fn reconcile(
        &self,
        set: &PlayerSet,
        player: &ContestPlayer,
        teams: &TeamDirectory,
        rosters: &mut HashMap<String, Vec<RosterEntry>>,
    ) -> Option<PlayerIdentity> {
        let name = player.full_name();
        let Some(abbrev) = teams.resolve_team_abbrev(&player.team.id, &self.overrides.team_names)
        else {
            warn!(set_id = %set.id, contest_player = %player.id, team_id = %player.team.id,
                "cannot resolve team for {name}; candidate excluded");
            return None;
        };

        if !rosters.contains_key(&abbrev) {
            let roster = self.source.team_roster(&abbrev, self.season).await;
            debug!("fetched {abbrev} roster: {} players", roster.len());
            rosters.insert(abbrev.clone(), roster);
        }
        let roster = rosters.get(&abbrev).map(Vec::as_slice).unwrap_or_default();

        let jersey = resolve_jersey_number(
            &name,
            player.jersey_number(),
            roster,
            &self.overrides.jersey_numbers,
        );
        match match_roster_entry(&name, jersey, roster) {
            Some(found) => {
                debug!(set_id = %set.id, player_id = found.entry.player_id,
                    "matched {name} to {} by {}", found.entry.full_name, found.method);
                Some(PlayerIdentity::from(found.entry))
            }
            None => {
                warn!(set_id = %set.id, contest_player = %player.id, team = %abbrev, ?jersey,
                    "no roster match for {name}; candidate excluded");
                None
            }
        }
    }
}

/// Score the slot picks against what happened on `date`. `None` when no
/// slot has a pick, or the date has no playable games or boxscore data.
pub async fn score_slots<S: DataSource + ?Sized>(
    backtester: &Backtester<'_, S>,
    date: NaiveDate,
    rankings: &[SlotRanking],
) -> Option<BacktestDayResult> {
    if rankings.iter().all(|r| r.pick().is_none()) {
        warn!(%date, "no slot has a pick; nothing to score");
        return None;
    }
    let ledger = backtester.collect_day(date).await?;
    if ledger.is_empty() {
        warn!(%date, "no boxscore data for the contest date; picks not scored");
        return None;
    }
    let scorers = ledger.scorers();
    let picks = rankings
        .iter()
        .filter_map(|r| r.pick().map(|p| (p, Some(r.set_id.clone()))));
    Some(BacktestDayResult::score(date, picks, &scorers))
}

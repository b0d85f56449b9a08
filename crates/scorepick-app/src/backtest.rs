// Backtest orchestrator: replays the pick heuristic day by day against
// games that have already been played.
//
// Each day is processed completely before the next one starts:
// schedule -> playable games -> boxscores -> aggregation -> ranking -> scoring.
// Nothing is carried across days except the report itself.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use scorepick_core::player::{
    PlayerGameAppearance, PlayerId, PlayerIdentity, PlayerSeasonStats, ScheduledGame,
};
use scorepick_core::ranking::{rank, top_n};
use scorepick_core::season::SeasonId;
use scorepick_nhl::aggregate::aggregate;
use scorepick_nhl::DataSource;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One simulated pick and whether the player scored that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPick {
    pub player_id: PlayerId,
    pub name: String,
    pub team_abbrev: String,
    /// Contest slot the pick was drawn from; `None` for the pooled mode.
    pub slot: Option<String>,
    pub scored_on_date: bool,
}

/// Outcome of one evaluated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestDayResult {
    pub date: NaiveDate,
    pub picks: Vec<RankedPick>,
    pub correct_count: usize,
    pub total_count: usize,
}

impl BacktestDayResult {
    /// Join the picks against the set of players who scored.
    pub fn score<'a, I>(date: NaiveDate, picks: I, scorers: &HashSet<PlayerId>) -> Self
    where
        I: IntoIterator<Item = (&'a PlayerSeasonStats, Option<String>)>,
    {
        let picks: Vec<RankedPick> = picks
            .into_iter()
            .map(|(stats, slot)| RankedPick {
                player_id: stats.player_id,
                name: stats.full_name.clone(),
                team_abbrev: stats.team_abbrev.clone(),
                slot,
                scored_on_date: scorers.contains(&stats.player_id),
            })
            .collect();
        let correct_count = picks.iter().filter(|p| p.scored_on_date).count();
        BacktestDayResult {
            date,
            total_count: picks.len(),
            correct_count,
            picks,
        }
    }
}

/// Accuracy for one pick position (pooled) or one contest slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAccuracy {
    pub label: String,
    pub correct: usize,
    pub total: usize,
}

impl PositionAccuracy {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }
}

/// Totals across a whole backtest report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub days_evaluated: usize,
    pub total_picks: usize,
    pub total_correct: usize,
    pub by_position: Vec<PositionAccuracy>,
}

impl BacktestSummary {
    pub fn from_results(results: &[BacktestDayResult]) -> Self {
        let mut by_position: Vec<PositionAccuracy> = Vec::new();
        for day in results {
            for (i, pick) in day.picks.iter().enumerate() {
                let label = match &pick.slot {
                    Some(slot) => format!("set_{slot}"),
                    None => format!("pick_{}", i + 1),
                };
                let entry = match by_position.iter().position(|p| p.label == label) {
                    Some(idx) => &mut by_position[idx],
                    None => {
                        by_position.push(PositionAccuracy {
                            label,
                            correct: 0,
                            total: 0,
                        });
                        let last = by_position.len() - 1;
                        &mut by_position[last]
                    }
                };
                entry.total += 1;
                if pick.scored_on_date {
                    entry.correct += 1;
                }
            }
        }

        BacktestSummary {
            days_evaluated: results.len(),
            total_picks: results.iter().map(|d| d.total_count).sum(),
            total_correct: results.iter().map(|d| d.correct_count).sum(),
            by_position,
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.total_correct, self.total_picks)
    }
}

pub(crate) fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

// ---------------------------------------------------------------------------
// Per-day ledger
// ---------------------------------------------------------------------------

/// Players seen on one date, in first-seen order, with their goal totals
/// summed across every game they appeared in that day.
#[derive(Debug, Clone, Default)]
pub struct DayLedger {
    players: Vec<PlayerIdentity>,
    goals: HashMap<PlayerId, u32>,
}

impl DayLedger {
    pub fn record(&mut self, appearance: &PlayerGameAppearance) {
        match self.goals.get_mut(&appearance.player_id) {
            Some(total) => *total += appearance.goals_in_game,
            None => {
                self.goals
                    .insert(appearance.player_id, appearance.goals_in_game);
                self.players.push(PlayerIdentity::from(appearance));
            }
        }
    }

    /// Distinct players in first-seen order.
    pub fn players(&self) -> &[PlayerIdentity] {
        &self.players
    }

    /// Everyone with at least one goal on the day.
    pub fn scorers(&self) -> HashSet<PlayerId> {
        self.goals
            .iter()
            .filter(|(_, goals)| **goals > 0)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the pooled backtest against a data source.
///
/// `season` and `today` are fixed at construction, so a run is determined
/// by its inputs and the clock reading taken at startup.
pub struct Backtester<'a, S: DataSource + ?Sized> {
    source: &'a S,
    season: SeasonId,
    today: NaiveDate,
    top_n: usize,
}

impl<'a, S: DataSource + ?Sized> Backtester<'a, S> {
    pub fn new(source: &'a S, season: SeasonId, today: NaiveDate, top_n: usize) -> Self {
        Backtester {
            source,
            season,
            today,
            top_n,
        }
    }

    /// Evaluate every day of the inclusive range. An inverted range yields
    /// an empty report.
    pub async fn run(&self, start: NaiveDate, end: NaiveDate) -> Vec<BacktestDayResult> {
        let mut results = Vec::new();
        if start > end {
            warn!(%start, %end, "start date is after end date; nothing to evaluate");
            return results;
        }

        let mut date = start;
        while date <= end {
            if let Some(result) = self.run_day(date).await {
                info!(
                    %date,
                    correct = result.correct_count,
                    total = result.total_count,
                    "day evaluated"
                );
                results.push(result);
            }
            date += Duration::days(1);
        }
        info!("backtest finished: {} days evaluated", results.len());
        results
    }

    /// Evaluate one day. `None` means the day had nothing to evaluate:
    /// no playable games, or no player whose stats could be obtained.
    pub async fn run_day(&self, date: NaiveDate) -> Option<BacktestDayResult> {
        let ledger = self.collect_day(date).await?;
        if ledger.is_empty() {
            warn!(%date, "no boxscore data for any game; day skipped");
            return None;
        }
        let candidates = self.build_candidates(date, ledger.players()).await;
        if candidates.is_empty() {
            warn!(%date, players = ledger.players().len(), "no player could be aggregated; day skipped");
            return None;
        }
        let ranked = rank(&candidates);
        let picks = top_n(&ranked, self.top_n);
        debug!(%date, candidates = ranked.len(), picks = picks.len(), "ranked day");

        let scorers = ledger.scorers();
        Some(BacktestDayResult::score(
            date,
            picks.iter().map(|p| (p, None)),
            &scorers,
        ))
    }

    /// Games on `date` that have started, not counting later dates the
    /// schedule query also returns.
    pub async fn playable_games(&self, date: NaiveDate) -> Vec<ScheduledGame> {
        if date > self.today {
            info!(%date, "skipping future date");
            return Vec::new();
        }
        let schedule = self.source.schedule_for_date(date).await;
        schedule
            .into_iter()
            .filter(|g| g.date == date && g.date <= self.today)
            .filter(|g| {
                if g.state.is_future() {
                    debug!(%date, game_id = g.game_id, "skipping game that has not started");
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Walk every playable game's boxscore for `date`. `None` when the day
    /// has no playable games at all.
    pub async fn collect_day(&self, date: NaiveDate) -> Option<DayLedger> {
        let games = self.playable_games(date).await;
        if games.is_empty() {
            info!(%date, "no playable games; day skipped");
            return None;
        }

        let mut ledger = DayLedger::default();
        for game in &games {
            let Some(boxscore) = self.source.boxscore(game.game_id).await else {
                warn!(%date, game_id = game.game_id, "boxscore unavailable; game contributes no players");
                continue;
            };
            if boxscore.state.is_future() {
                debug!(%date, game_id = game.game_id, "boxscore reports game not started");
                continue;
            }
            if let Some(played_on) = boxscore.game_date.filter(|d| *d != date) {
                warn!(%date, %played_on, game_id = game.game_id, "boxscore is for another date; ignored");
                continue;
            }
            for appearance in &boxscore.appearances {
                ledger.record(appearance);
            }
        }
        Some(ledger)
    }

    /// Season stats for each player, in the order given. Players whose
    /// stats cannot be obtained are left out.
    pub async fn build_candidates(
        &self,
        date: NaiveDate,
        players: &[PlayerIdentity],
    ) -> Vec<PlayerSeasonStats> {
        let injuries = self.source.injury_report().await;
        let mut candidates = Vec::with_capacity(players.len());
        for identity in players {
            let player_id = identity.player_id;
            let Some(landing) = self.source.player_landing(player_id).await else {
                warn!(%date, player_id, "player landing unavailable; player excluded");
                continue;
            };
            match aggregate(identity, &landing, self.season, injuries) {
                Ok(stats) => {
                    debug!(%date, player_id, goals = stats.goals, "aggregated {}", stats.full_name);
                    candidates.push(stats);
                }
                Err(e) => warn!(%date, player_id, "player excluded: {e}"),
            }
        }
        candidates
    }
}

/// Default evaluation window: the `days` days ending on `end`, inclusive.
pub fn default_range(end: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let span = i64::from(days.max(1)) - 1;
    (end - Duration::days(span), end)
}

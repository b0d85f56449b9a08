// Pooled backtest behaviour against an in-memory data source.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use scorepick_app::backtest::{BacktestSummary, Backtester};
use scorepick_core::player::{
    Boxscore, GameId, GameState, InjuryReport, LeagueTeam, PlayerId, Position, RosterEntry,
    ScheduledGame,
};
use scorepick_core::season::SeasonId;
use scorepick_nhl::api::PlayerLanding;
use scorepick_nhl::retry::{with_backoff, FetchError, RetryPolicy};
use scorepick_nhl::DataSource;

use common::*;

const TODAY: &str = "2025-03-01";

/// One final game on 2025-01-15: a forward with two goals and a scoreless
/// defenseman.
fn one_game_day() -> FakeSource {
    let mut source = FakeSource::default();
    source.add_game(
        game(100, "2025-01-15", GameState::Final),
        Some(boxscore(
            100,
            vec![
                skater(1, "Cole Caufield", Position::RightWing, 2),
                skater(2, "Lane Hutson", Position::Defense, 0),
            ],
        )),
    );
    source.add_landing(1, landing(25, 50, &[1, 0, 2, 0, 1]));
    source.add_landing(2, landing(5, 50, &[0, 0, 1, 0, 0]));
    source
}

#[tokio::test]
async fn empty_schedule_emits_no_day() {
    let source = FakeSource::default();
    let backtester = Backtester::new(&source, season(), d(TODAY), 3);
    let results = backtester.run(d("2025-01-10"), d("2025-01-12")).await;

    assert!(results.is_empty());
    assert_eq!(source.calls_starting_with("schedule"), 3);
    assert_eq!(source.calls_starting_with("boxscore"), 0);
}

#[tokio::test]
async fn scoring_forward_is_the_pick() {
    let source = one_game_day();
    let day = d("2025-01-15");

    let single = Backtester::new(&source, season(), d(TODAY), 1)
        .run(day, day)
        .await;
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].picks[0].player_id, 1);
    assert!(single[0].picks[0].scored_on_date);
    assert_eq!(single[0].correct_count, 1);
    assert_eq!(single[0].total_count, 1);

    // Two candidates for three picks: the pool caps the pick count.
    let pooled = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert_eq!(pooled[0].total_count, 2);
    assert_eq!(pooled[0].correct_count, 1);
    assert_eq!(pooled[0].picks[0].name, "Cole Caufield");
    assert!(!pooled[0].picks[1].scored_on_date);
}

#[tokio::test]
async fn player_without_active_season_row_is_excluded() {
    let mut source = one_game_day();
    let mut b = source.boxscores[&100].clone();
    b.appearances.push(skater(3, "Veteran Returnee", Position::Center, 1));
    source.boxscores.insert(100, b);
    // Big numbers, but only for last season.
    source.add_landing(3, landing_for_season(20232024, 60, 82, &[3, 3, 3, 3, 3]));

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    let picked: Vec<_> = results[0].picks.iter().map(|p| p.player_id).collect();
    assert_eq!(picked, vec![1, 2]);
    assert_eq!(source.calls_starting_with("landing 3"), 1);
}

#[tokio::test]
async fn missing_landing_excludes_player_but_keeps_day() {
    let mut source = one_game_day();
    source.landings.remove(&1);

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].total_count, 1);
    assert_eq!(results[0].picks[0].player_id, 2);
    assert_eq!(results[0].correct_count, 0);
}

#[tokio::test]
async fn unavailable_boxscore_contributes_nothing() {
    let mut source = one_game_day();
    // Second game that day with no boxscore available.
    source.add_game(game(101, "2025-01-15", GameState::Final), None);

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].total_count, 2);
    assert_eq!(source.calls_starting_with("boxscore"), 2);
}

#[tokio::test]
async fn day_without_any_boxscore_is_skipped() {
    let mut source = FakeSource::default();
    source.add_game(game(100, "2025-01-15", GameState::Final), None);
    source.add_game(game(101, "2025-01-15", GameState::Final), None);

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert!(results.is_empty());
    assert_eq!(source.calls_starting_with("boxscore"), 2);
    assert_eq!(BacktestSummary::from_results(&results).days_evaluated, 0);
}

#[tokio::test]
async fn day_where_no_player_aggregates_is_skipped() {
    let mut source = one_game_day();
    source.landings.clear();

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert!(results.is_empty());
    assert_eq!(source.calls_starting_with("landing"), 2);
}

#[tokio::test]
async fn boxscore_dated_elsewhere_is_ignored() {
    let mut source = one_game_day();
    let mut stale = boxscore(101, vec![skater(3, "Nick Suzuki", Position::Center, 1)]);
    stale.game_date = Some(d("2025-01-14"));
    source.add_game(game(101, "2025-01-15", GameState::Final), Some(stale));
    source.add_landing(3, landing(20, 50, &[1, 1, 1, 1, 1]));

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    let picked: Vec<_> = results[0].picks.iter().map(|p| p.player_id).collect();
    assert_eq!(picked, vec![1, 2]);
    assert_eq!(source.calls_starting_with("landing 3"), 0);
}

#[tokio::test]
async fn inverted_range_is_empty_without_requests() {
    let source = one_game_day();
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(d("2025-01-20"), d("2025-01-10"))
        .await;
    assert!(results.is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn future_games_and_other_dates_are_ignored() {
    let mut source = one_game_day();
    // The schedule query returns the whole week; a later entry and an
    // unplayed game on the day itself must both be dropped.
    source
        .schedules
        .get_mut(&d("2025-01-15"))
        .unwrap()
        .extend([
            game(200, "2025-01-16", GameState::Final),
            game(201, "2025-01-15", GameState::Future),
        ]);

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(source.calls_starting_with("boxscore"), 1);
}

#[tokio::test]
async fn all_future_day_behaves_like_empty_schedule() {
    let mut source = FakeSource::default();
    source.add_game(game(300, "2025-01-15", GameState::Future), None);
    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn dates_after_today_are_not_requested() {
    let source = one_game_day();
    let results = Backtester::new(&source, season(), d("2025-01-15"), 3)
        .run(d("2025-01-15"), d("2025-01-17"))
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(source.calls_starting_with("schedule"), 1);
}

#[tokio::test]
async fn goals_accumulate_across_games_on_one_date() {
    let mut source = FakeSource::default();
    source.add_game(
        game(400, "2025-01-15", GameState::Final),
        Some(boxscore(400, vec![skater(9, "Twice Played", Position::Center, 0)])),
    );
    source.add_game(
        game(401, "2025-01-15", GameState::Final),
        Some(boxscore(401, vec![skater(9, "Twice Played", Position::Center, 1)])),
    );
    source.add_landing(9, landing(10, 40, &[]));

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    assert_eq!(results[0].total_count, 1);
    assert_eq!(results[0].correct_count, 1);
    // Aggregated once even though seen twice.
    assert_eq!(source.calls_starting_with("landing 9"), 1);
}

#[tokio::test]
async fn ranking_uses_goals_then_recent_form() {
    let mut source = FakeSource::default();
    source.add_game(
        game(500, "2025-01-15", GameState::Final),
        Some(boxscore(
            500,
            vec![
                skater(1, "Cold Streak", Position::Center, 0),
                skater(2, "Hot Streak", Position::Center, 1),
                skater(3, "Leader", Position::Center, 0),
                skater(4, "Depth", Position::Defense, 0),
            ],
        )),
    );
    source.add_landing(1, landing(20, 50, &[0, 0, 0, 0, 0]));
    source.add_landing(2, landing(20, 50, &[1, 1, 0, 1, 0]));
    source.add_landing(3, landing(30, 50, &[0, 0, 0, 0, 0]));
    source.add_landing(4, landing(2, 50, &[0, 0, 0, 0, 1]));

    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;
    let picked: Vec<_> = results[0].picks.iter().map(|p| p.player_id).collect();
    assert_eq!(picked, vec![3, 2, 1]);
    assert_eq!(results[0].correct_count, 1);

    let summary = BacktestSummary::from_results(&results);
    assert_eq!(summary.by_position[1].label, "pick_2");
    assert_eq!(summary.by_position[1].correct, 1);
}

// ---- retry exhaustion through the gateway seam ----

/// Boxscores that fail at the network level on every attempt.
struct UnreachableBoxscores {
    inner: FakeSource,
    attempts: AtomicU32,
}

#[async_trait]
impl DataSource for UnreachableBoxscores {
    async fn schedule_for_date(&self, date: NaiveDate) -> Vec<ScheduledGame> {
        self.inner.schedule_for_date(date).await
    }

    async fn boxscore(&self, game_id: GameId) -> Option<Boxscore> {
        if game_id != 100 {
            return self.inner.boxscore(game_id).await;
        }
        let attempts = &self.attempts;
        with_backoff(&RetryPolicy::default(), "boxscore", move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<Boxscore, _>(FetchError::Transport {
                message: "connection reset".into(),
            })
        })
        .await
    }

    async fn player_landing(&self, player_id: PlayerId) -> Option<PlayerLanding> {
        self.inner.player_landing(player_id).await
    }

    async fn team_roster(&self, team_abbrev: &str, season: SeasonId) -> Vec<RosterEntry> {
        self.inner.team_roster(team_abbrev, season).await
    }

    async fn teams(&self) -> Vec<LeagueTeam> {
        self.inner.teams().await
    }

    async fn injury_report(&self) -> &InjuryReport {
        self.inner.injury_report().await
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_skip_only_that_game() {
    let mut inner = one_game_day();
    inner.add_game(
        game(102, "2025-01-15", GameState::Final),
        Some(boxscore(102, vec![skater(5, "Other Game", Position::LeftWing, 1)])),
    );
    inner.add_landing(5, landing(8, 50, &[]));
    let source = UnreachableBoxscores {
        inner,
        attempts: AtomicU32::new(0),
    };

    let start = tokio::time::Instant::now();
    let day = d("2025-01-15");
    let results = Backtester::new(&source, season(), d(TODAY), 3)
        .run(day, day)
        .await;

    assert_eq!(source.attempts.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(results.len(), 1);
    let picked: Vec<_> = results[0].picks.iter().map(|p| p.player_id).collect();
    assert_eq!(picked, vec![5]);
    assert_eq!(results[0].correct_count, 1);
}

// Deterministic ranking rule: season goals, then recent goals, then
// goals per game, all descending.

use std::cmp::Ordering;

use crate::player::PlayerSeasonStats;

/// Compare two candidates best-first.
///
/// Keys in priority order: season goals, goals over the trailing five
/// games, goals per game. An undefined goals-per-game sorts below every
/// defined value. Full ties compare `Equal` so a stable sort keeps the
/// input order.
pub fn compare(a: &PlayerSeasonStats, b: &PlayerSeasonStats) -> Ordering {
    b.goals
        .cmp(&a.goals)
        .then_with(|| b.recent_goals.cmp(&a.recent_goals))
        .then_with(|| rate_key(b.goals_per_game).total_cmp(&rate_key(a.goals_per_game)))
}

fn rate_key(rate: Option<f64>) -> f64 {
    match rate {
        Some(r) if !r.is_nan() => r,
        _ => f64::NEG_INFINITY,
    }
}

/// Rank a candidate set best-first without touching the input.
///
/// The output is a permutation of the input; ties at every key keep their
/// relative input order.
pub fn rank(candidates: &[PlayerSeasonStats]) -> Vec<PlayerSeasonStats> {
    let mut ranked = candidates.to_vec();
    // `sort_by` is stable.
    ranked.sort_by(compare);
    ranked
}

/// The first `n` entries of an already ranked list (fewer if the pool is small).
pub fn top_n(ranked: &[PlayerSeasonStats], n: usize) -> &[PlayerSeasonStats] {
    &ranked[..n.min(ranked.len())]
}

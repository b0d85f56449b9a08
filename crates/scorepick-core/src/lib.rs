// Core types and pure transforms shared by the gateway and the backtester:
// configuration, season identifiers, the canonical player model, identity
// reconciliation and the ranking rule.

pub mod config;
pub mod names;
pub mod player;
pub mod ranking;
pub mod reconcile;
pub mod season;

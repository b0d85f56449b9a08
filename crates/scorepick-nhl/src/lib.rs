// League data gateway (schedule, boxscores, player landings, rosters, teams,
// injury report) and the season-stat aggregator built on its payloads.

pub mod aggregate;
pub mod api;
pub mod client;
pub mod retry;
pub mod source;

pub use client::NhlClient;
pub use source::DataSource;

// HTTP implementation of `DataSource` against the public league APIs and
// the injury-report table.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use scorepick_core::config::ApiConfig;
use scorepick_core::player::{
    Boxscore, GameId, InjuryReport, LeagueTeam, PlayerId, RosterEntry, ScheduledGame,
};
use scorepick_core::season::SeasonId;

use crate::api::{
    normalize_boxscore, normalize_injuries, normalize_roster, normalize_schedule,
    normalize_teams, BoxscoreResponse, InjuryRow, PlayerLanding, RosterResponse,
    ScheduleResponse, TeamsResponse,
};
use crate::retry::{with_backoff, FetchError, RetryPolicy};
use crate::source::DataSource;

const USER_AGENT: &str = concat!("scorepick/", env!("CARGO_PKG_VERSION"));

/// League API client with retry/backoff and a process-lifetime injury cache.
pub struct NhlClient {
    http: Client,
    web_base_url: String,
    stats_base_url: String,
    injury_report_url: String,
    retry: RetryPolicy,
    injuries: OnceCell<InjuryReport>,
}

impl NhlClient {
    pub fn new(api: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(NhlClient {
            http,
            web_base_url: api.web_base_url.trim_end_matches('/').to_string(),
            stats_base_url: api.stats_base_url.trim_end_matches('/').to_string(),
            injury_report_url: api.injury_report_url.clone(),
            retry: RetryPolicy::from_config(api),
            injuries: OnceCell::new(),
        })
    }

    /// Fetch the injury report now instead of on first use.
    pub async fn load_injury_report(&self) -> &InjuryReport {
        self.injuries
            .get_or_init(|| async {
                let rows: Vec<InjuryRow> = self
                    .get_json(&self.injury_report_url, "injury report")
                    .await
                    .unwrap_or_default();
                let report = normalize_injuries(rows);
                if report.is_empty() {
                    warn!("injury report is empty; no player will be flagged as injured");
                } else {
                    info!("loaded {} injured player names", report.len());
                }
                report
            })
            .await
    }

    /// One GET with retries, decoded as `T`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Option<T> {
        let this = self;
        with_backoff(&self.retry, what, move || this.fetch_once::<T>(url)).await
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DataSource for NhlClient {
    async fn schedule_for_date(&self, date: NaiveDate) -> Vec<ScheduledGame> {
        let url = format!("{}/schedule/{}", self.web_base_url, date.format("%Y-%m-%d"));
        let what = format!("schedule for {date}");
        self.get_json::<ScheduleResponse>(&url, &what)
            .await
            .map(normalize_schedule)
            .unwrap_or_default()
    }

    async fn boxscore(&self, game_id: GameId) -> Option<Boxscore> {
        let url = format!("{}/gamecenter/{game_id}/boxscore", self.web_base_url);
        let what = format!("boxscore for game {game_id}");
        self.get_json::<BoxscoreResponse>(&url, &what)
            .await
            .map(normalize_boxscore)
    }

    async fn player_landing(&self, player_id: PlayerId) -> Option<PlayerLanding> {
        let url = format!("{}/player/{player_id}/landing", self.web_base_url);
        let what = format!("landing for player {player_id}");
        self.get_json::<PlayerLanding>(&url, &what).await
    }

    async fn team_roster(&self, team_abbrev: &str, season: SeasonId) -> Vec<RosterEntry> {
        let url = format!("{}/roster/{team_abbrev}/{season}", self.web_base_url);
        let what = format!("{team_abbrev} roster for {season}");
        self.get_json::<RosterResponse>(&url, &what)
            .await
            .map(|raw| normalize_roster(raw, team_abbrev))
            .unwrap_or_default()
    }

    async fn teams(&self) -> Vec<LeagueTeam> {
        let url = format!("{}/team", self.stats_base_url);
        self.get_json::<TeamsResponse>(&url, "league team list")
            .await
            .map(normalize_teams)
            .unwrap_or_default()
    }

    async fn injury_report(&self) -> &InjuryReport {
        self.load_injury_report().await
    }
}

//! SportsData.io player feed

use crate::de::opt_string;
use crate::error::{FeedError, Result};
use crate::http::{build_client, get_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub const SPORTSDATA_BASE_URL: &str = "https://api.sportsdata.io/v3/nfl";

/// One player from `scores/json/Players` or `scores/json/Rookies/{season}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SportsDataPlayer {
    #[serde(rename = "PlayerID")]
    pub player_id: i64,

    #[serde(rename = "FirstName", default, deserialize_with = "opt_string")]
    pub first_name: Option<String>,

    #[serde(rename = "LastName", default, deserialize_with = "opt_string")]
    pub last_name: Option<String>,

    #[serde(rename = "Position", default, deserialize_with = "opt_string")]
    pub position: Option<String>,

    #[serde(rename = "Team", default, deserialize_with = "opt_string")]
    pub team: Option<String>,

    #[serde(rename = "Status", default, deserialize_with = "opt_string")]
    pub status: Option<String>,

    #[serde(rename = "SportRadarPlayerID", default, deserialize_with = "opt_string")]
    pub sportradar_id: Option<String>,

    #[serde(rename = "FanDuelPlayerID", default, deserialize_with = "opt_string")]
    pub fanduel_id: Option<String>,

    #[serde(rename = "DraftKingsPlayerID", default, deserialize_with = "opt_string")]
    pub draftkings_id: Option<String>,

    /// Feet and inches, e.g. `6'2"`
    #[serde(rename = "Height", default, deserialize_with = "opt_string")]
    pub height: Option<String>,

    #[serde(rename = "Weight", default)]
    pub weight: Option<i64>,

    #[serde(rename = "College", default, deserialize_with = "opt_string")]
    pub college: Option<String>,

    /// ISO timestamp; only the date part is meaningful
    #[serde(rename = "BirthDate", default, deserialize_with = "opt_string")]
    pub birth_date: Option<String>,

    #[serde(rename = "CollegeDraftYear", default)]
    pub college_draft_year: Option<i64>,

    #[serde(rename = "CollegeDraftRound", default)]
    pub college_draft_round: Option<i64>,

    #[serde(rename = "CollegeDraftPick", default)]
    pub college_draft_pick: Option<i64>,

    /// Rookie feed only
    #[serde(rename = "DraftRound", default)]
    pub draft_round: Option<i64>,

    /// Rookie feed only
    #[serde(rename = "DraftPick", default)]
    pub draft_pick: Option<i64>,

    #[serde(rename = "PhotoUrl", default, deserialize_with = "opt_string")]
    pub photo_url: Option<String>,

    #[serde(rename = "UsaTodayHeadshotNoBackgroundUrl", default, deserialize_with = "opt_string")]
    pub usa_today_headshot_no_background_url: Option<String>,
}

impl SportsDataPlayer {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Upper-cased position, empty when unknown
    pub fn position_code(&self) -> String {
        self.position.as_deref().unwrap_or_default().to_uppercase()
    }

    /// No-background headshot when available, else the plain photo
    pub fn headshot_url(&self) -> Option<&str> {
        self.usa_today_headshot_no_background_url
            .as_deref()
            .or(self.photo_url.as_deref())
    }

    /// Birth date as `YYYY-MM-DD`; placeholder zero dates are rejected
    pub fn birth_date_ymd(&self) -> Option<String> {
        let date: String = self.birth_date.as_deref()?.chars().take(10).collect();
        (date.len() == 10 && !date.starts_with("0000")).then_some(date)
    }
}

/// Client for the SportsData.io NFL API
pub struct SportsDataClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SportsDataClient {
    pub fn new(api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(FeedError::MissingApiKey("SPORTSDATA_API_KEY"));
        }
        Ok(Self {
            client: build_client("nfl-db/1.0", Duration::from_secs(60))?,
            base_url: SPORTSDATA_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, path: &str) -> Result<Vec<SportsDataPlayer>> {
        let url = format!("{}/{}", self.base_url, path);
        info!("Fetching {}", url);
        let request = self
            .client
            .get(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key);
        let players: Vec<SportsDataPlayer> = get_json(request, "SportsData request").await?;
        info!("Fetched {} players from SportsData.io", players.len());
        Ok(players)
    }

    /// Every active and inactive player
    pub async fn players(&self) -> Result<Vec<SportsDataPlayer>> {
        self.fetch("scores/json/Players").await
    }

    /// Rookie class of a season
    pub async fn rookies(&self, season: i32) -> Result<Vec<SportsDataPlayer>> {
        self.fetch(&format!("scores/json/Rookies/{season}")).await
    }
}

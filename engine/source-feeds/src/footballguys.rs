//! Footballguys player list and preseason projections

use crate::de::{opt_string, value_to_f64};
use crate::error::{FeedError, Result};
use crate::http::{build_client, get_json};
use crate::imports::parse_whole_number;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

pub const FBG_PLAYERS_URL: &str = "https://appdata.footballguys.com/tn/NFLPlayers.json";
pub const FBG_PROJECTIONS_URL: &str = "https://www.footballguys.com/api/projections/preseason";

/// One entry of `NFLPlayers.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FbgPlayer {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub first: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last: Option<String>,
    /// Lower-case FBG position code (`qb`, `pk`, `fb`, ...)
    #[serde(default, deserialize_with = "opt_string")]
    pub pos: Option<String>,
    /// FantasyData / SportsData ID
    #[serde(default, deserialize_with = "opt_string")]
    pub fd_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub mfl_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub weight: Option<String>,
}

impl FbgPlayer {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first.as_deref().unwrap_or_default(),
            self.last.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Weight in pounds when numeric
    pub fn weight_lbs(&self) -> Option<i64> {
        parse_whole_number(self.weight.as_deref()?)
    }

    /// MFL ID, ignoring the `"0"` placeholder
    pub fn mfl(&self) -> Option<&str> {
        self.mfl_id.as_deref().filter(|id| *id != "0")
    }
}

/// Stat line keyed by FBG stat code (`pass-yds`, `rec-rec`, ...)
pub type FbgStatLine = BTreeMap<String, Value>;

/// Numeric value of a stat, when present
pub fn stat(line: &FbgStatLine, key: &str) -> Option<f64> {
    line.get(key).and_then(value_to_f64)
}

/// Client for the Footballguys endpoints
pub struct FootballguysClient {
    client: Client,
    players_url: String,
    projections_url: String,
    api_key: Option<String>,
}

impl FootballguysClient {
    /// The player list is public; projections need `api_key`
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: build_client("Mozilla/5.0", Duration::from_secs(60))?,
            players_url: FBG_PLAYERS_URL.to_string(),
            projections_url: FBG_PROJECTIONS_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()).map(str::to_string),
        })
    }

    pub fn with_urls(mut self, players_url: &str, projections_url: &str) -> Self {
        self.players_url = players_url.to_string();
        self.projections_url = projections_url.to_string();
        self
    }

    pub async fn players(&self) -> Result<Vec<FbgPlayer>> {
        info!("Fetching FBG NFLPlayers.json...");
        let players: Vec<FbgPlayer> = get_json(self.client.get(&self.players_url), "FBG players").await?;
        info!("{} players from FBG", players.len());
        Ok(players)
    }

    /// Preseason projections for `year`, keyed by FBG player ID
    pub async fn projections(&self, year: i32) -> Result<BTreeMap<String, FbgStatLine>> {
        let api_key = self.api_key.as_deref().ok_or(FeedError::MissingApiKey("FBG_API_KEY"))?;
        info!("Fetching FBG preseason projections for {}...", year);
        let request = self
            .client
            .get(&self.projections_url)
            .query(&[("year", year.to_string()), ("apikey", api_key.to_string())]);
        let projections: BTreeMap<String, FbgStatLine> = get_json(request, "FBG projections").await?;
        info!("{} projected players", projections.len());
        Ok(projections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_list() {
        let json = r#"[
            {"id": "AlleJo02", "first": "Josh", "last": "Allen", "pos": "qb",
             "fd_id": 19801, "mfl_id": "13589", "height": "6-5", "weight": "237"},
            {"id": "NewRo01", "first": "New", "last": "Rookie", "pos": "wr", "mfl_id": "0"}
        ]"#;
        let players: Vec<FbgPlayer> = serde_json::from_str(json).unwrap();

        assert_eq!(players[0].full_name(), "Josh Allen");
        assert_eq!(players[0].fd_id.as_deref(), Some("19801"));
        assert_eq!(players[0].weight_lbs(), Some(237));
        assert_eq!(players[0].mfl(), Some("13589"));
        assert_eq!(players[1].mfl(), None);
        assert_eq!(players[1].weight_lbs(), None);
    }

    #[test]
    fn test_stat_reads_numbers_and_strings() {
        let line: FbgStatLine =
            serde_json::from_str(r#"{"pass-yds": 4100.5, "pass-td": "31", "rec-rec": null}"#).unwrap();
        assert_eq!(stat(&line, "pass-yds"), Some(4100.5));
        assert_eq!(stat(&line, "pass-td"), Some(31.0));
        assert_eq!(stat(&line, "rec-rec"), None);
        assert_eq!(stat(&line, "rush-yds"), None);
    }

    #[tokio::test]
    async fn test_projections_require_key() {
        let client = FootballguysClient::new(Some("  ")).unwrap();
        assert!(matches!(client.projections(2026).await, Err(FeedError::MissingApiKey(_))));
    }
}

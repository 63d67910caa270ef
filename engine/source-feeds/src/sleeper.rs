//! Sleeper public player database

use crate::de::opt_string;
use crate::error::Result;
use crate::http::{build_client, get_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

pub const SLEEPER_PLAYERS_URL: &str = "https://api.sleeper.app/v1/players/nfl";

/// Sleeper's "not ranked" marker; missing ranks sort with it
pub const UNRANKED: i64 = 99_999;

/// One entry of the `/players/nfl` map
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SleeperPlayer {
    #[serde(default, deserialize_with = "opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub team: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub years_exp: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub search_rank: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub sportradar_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub espn_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub yahoo_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fantasy_data_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub stats_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub rotowire_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub rotoworld_id: Option<String>,
}

impl SleeperPlayer {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    pub fn has_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn position_code(&self) -> String {
        self.position.as_deref().unwrap_or_default().to_uppercase()
    }

    /// Active, inactive or blank status; retired players are excluded
    pub fn is_current(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_lowercase).as_deref(),
            None | Some("active") | Some("inactive")
        )
    }

    pub fn rank(&self) -> i64 {
        self.search_rank.unwrap_or(UNRANKED)
    }

    /// Vendor IDs keyed by Sleeper field name, the Sleeper ID itself as `player_id`
    pub fn id_fields<'a>(&'a self, sleeper_id: &'a str) -> [(&'static str, Option<&'a str>); 7] {
        [
            ("player_id", Some(sleeper_id)),
            ("espn_id", self.espn_id.as_deref()),
            ("yahoo_id", self.yahoo_id.as_deref()),
            ("fantasy_data_id", self.fantasy_data_id.as_deref()),
            ("stats_id", self.stats_id.as_deref()),
            ("rotowire_id", self.rotowire_id.as_deref()),
            ("rotoworld_id", self.rotoworld_id.as_deref()),
        ]
    }
}

/// Sleeper player map, keyed by Sleeper ID
pub type SleeperPlayers = HashMap<String, SleeperPlayer>;

/// Client for the unauthenticated Sleeper API
pub struct SleeperClient {
    client: Client,
    url: String,
}

impl SleeperClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client("nfl-db/1.0", Duration::from_secs(60))?,
            url: SLEEPER_PLAYERS_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// The full NFL player map (several megabytes)
    pub async fn players(&self) -> Result<SleeperPlayers> {
        info!("Fetching players from Sleeper API...");
        let players: SleeperPlayers = get_json(self.client.get(&self.url), "Sleeper players").await?;
        info!("Got {} entries from Sleeper", players.len());
        Ok(players)
    }
}

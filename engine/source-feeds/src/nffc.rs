//! NFFC public draft API
//!
//! Past seasons are served from the `historical*` endpoints, the running
//! season from the `public*` ones. The API reports problems as JSON objects
//! with a `message`; those and transport failures come back as `None`
//! rather than errors so one bad league does not sink a season pull.

use crate::de::{opt_string, value_to_bool};
use crate::error::{FeedError, Result};
use crate::http::{build_client, get_json};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::{deserialize_number_from_string, deserialize_option_number_from_string};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

pub const NFFC_BASE_URL: &str = "https://nfc.shgn.com/api/public";

/// Requests in flight while pulling a season
pub const MAX_IN_FLIGHT: usize = 5;

/// A league from the season list; unknown fields are kept for the cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NffcLeague {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NffcLeague {
    /// Rotowire Online Championship leagues
    pub fn is_rotowire_online(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("rotowire") && name.contains("online")
    }
}

/// Draft results of one league as saved to `drafts_<year>.json`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LeagueDraft {
    pub league_id: i64,
    pub league_name: String,
    pub picks: Vec<Value>,
}

/// One draft pick
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NffcPick {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub round: i64,
    /// Overall pick number
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub pick: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub team: i64,
    /// Sportradar player UUID
    pub player: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub pick_duration: Option<String>,
}

/// `league` block of a league detail
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LeagueInfo {
    #[serde(default, deserialize_with = "opt_string")]
    pub name: Option<String>,
    #[serde(rename = "rosterSize", default, deserialize_with = "deserialize_option_number_from_string")]
    pub roster_size: Option<i64>,
    #[serde(rename = "3rr", default)]
    pub third_round_reversal: Value,
    #[serde(default, deserialize_with = "opt_string")]
    pub draft_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub draft_completed_date: Option<String>,
}

impl LeagueInfo {
    pub fn has_third_round_reversal(&self) -> bool {
        value_to_bool(&self.third_round_reversal)
    }
}

/// Final standing of one team
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamOutcome {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub draft_order: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub league_rank: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub league_points: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub overall_rank: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub overall_points: Option<f64>,
}

/// League detail: settings plus team outcomes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LeagueDetail {
    #[serde(default)]
    pub league: LeagueInfo,
    #[serde(default)]
    pub teams: Vec<TeamOutcome>,
}

/// Player bio attached to an ADP entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdpPlayerInfo {
    #[serde(default, deserialize_with = "opt_string")]
    pub fname: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub lname: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub pos: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub dob: Option<String>,
}

/// One row of a season ADP file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdpEntry {
    pub player: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub adp: f64,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub min_pick: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_pick: Option<i64>,
    /// Times drafted
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub number: Option<i64>,
    #[serde(default)]
    pub player_info: AdpPlayerInfo,
}

/// Everything fetched for one league
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueFetch {
    pub league: NffcLeague,
    pub picks: Option<Vec<Value>>,
    pub detail: Option<Value>,
}

/// Picks from a draft-results response; API errors are `None`
///
/// Any object without a `draft_results` array is treated as an error, even
/// without a `message` key, since it carries no picks to build from.
pub fn draft_picks_from_response(response: Value) -> Option<Vec<Value>> {
    match response {
        Value::Array(picks) => Some(picks),
        Value::Object(mut object) => match object.remove("draft_results") {
            Some(Value::Array(picks)) => Some(picks),
            _ => None,
        },
        _ => None,
    }
}

/// League detail from a response; API error objects are `None`
pub fn league_detail_from_response(response: Value) -> Option<Value> {
    match &response {
        Value::Object(object) if object.contains_key("message") && !object.contains_key("league") => None,
        Value::Object(_) => Some(response),
        _ => None,
    }
}

/// Client for the NFFC public API
pub struct NffcClient {
    client: Client,
    base_url: String,
    api_key: String,
    current_season: i32,
}

impl NffcClient {
    pub fn new(api_key: &str, current_season: i32) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(FeedError::MissingApiKey("NFFC_API_KEY"));
        }
        Ok(Self {
            client: build_client("NFFC-Draft-Explorer/1.0", Duration::from_secs(30))?,
            base_url: NFFC_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            current_season,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn current_season(&self) -> i32 {
        self.current_season
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}?api_key={}", self.base_url, path, self.api_key)
    }

    pub fn leagues_url(&self, season: i32) -> String {
        if season == self.current_season {
            self.url("publicleagues/football")
        } else {
            self.url(&format!("historicalleagues/football/{season}"))
        }
    }

    pub fn draft_url(&self, season: i32, league_id: i64) -> String {
        if season == self.current_season {
            self.url(&format!("publicdraftresults/football/{league_id}"))
        } else {
            self.url(&format!("historicaldraftresults/football/{season}/{league_id}"))
        }
    }

    pub fn league_url(&self, season: i32, league_id: i64) -> String {
        if season == self.current_season {
            self.url(&format!("publicleagues/football/{league_id}"))
        } else {
            self.url(&format!("historicalleagues/football/{season}/{league_id}"))
        }
    }

    /// Leagues of a season
    pub async fn leagues(&self, season: i32) -> Result<Vec<NffcLeague>> {
        let response: Value = get_json(self.client.get(self.leagues_url(season)), "NFFC leagues").await?;
        match response {
            Value::Array(_) => Ok(serde_json::from_value(response)?),
            other => Err(FeedError::Api(format!("league list for {season}: {other}"))),
        }
    }

    async fn fetch_value(&self, url: String) -> Option<Value> {
        match get_json::<Value>(self.client.get(&url), "NFFC request").await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "NFFC request failed");
                None
            }
        }
    }

    pub async fn draft_results(&self, season: i32, league_id: i64) -> Option<Vec<Value>> {
        draft_picks_from_response(self.fetch_value(self.draft_url(season, league_id)).await?)
    }

    pub async fn league_detail(&self, season: i32, league_id: i64) -> Option<Value> {
        league_detail_from_response(self.fetch_value(self.league_url(season, league_id)).await?)
    }

    /// Draft results and detail for every league, `MAX_IN_FLIGHT` at a time
    pub async fn fetch_leagues(&self, season: i32, leagues: Vec<NffcLeague>) -> Vec<LeagueFetch> {
        let total = leagues.len();
        let mut done = 0;
        let mut results = Vec::with_capacity(total);

        let mut fetches = stream::iter(leagues)
            .map(|league| async move {
                let picks = self.draft_results(season, league.id).await;
                let detail = self.league_detail(season, league.id).await;
                LeagueFetch { league, picks, detail }
            })
            .buffer_unordered(MAX_IN_FLIGHT);

        while let Some(fetch) = fetches.next().await {
            done += 1;
            if done % 100 == 0 {
                info!("{}: {}/{} leagues done", season, done, total);
            }
            results.push(fetch);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> NffcClient {
        NffcClient::new("key", 2025).unwrap()
    }

    #[test]
    fn test_endpoint_selection_by_season() {
        let nffc = client();
        assert_eq!(
            nffc.leagues_url(2025),
            "https://nfc.shgn.com/api/public/publicleagues/football?api_key=key"
        );
        assert_eq!(
            nffc.leagues_url(2021),
            "https://nfc.shgn.com/api/public/historicalleagues/football/2021?api_key=key"
        );
        assert_eq!(
            nffc.draft_url(2021, 77),
            "https://nfc.shgn.com/api/public/historicaldraftresults/football/2021/77?api_key=key"
        );
        assert_eq!(
            nffc.league_url(2025, 77),
            "https://nfc.shgn.com/api/public/publicleagues/football/77?api_key=key"
        );
    }

    #[test]
    fn test_draft_response_shapes() {
        let picks = draft_picks_from_response(json!({"draft_results": [{"round": 1}]}));
        assert_eq!(picks.map(|p| p.len()), Some(1));
        assert_eq!(draft_picks_from_response(json!({"message": "Invalid league id"})), None);
        assert_eq!(draft_picks_from_response(json!({"status": "pending"})), None);
        assert_eq!(draft_picks_from_response(json!([])), Some(vec![]));
        assert_eq!(league_detail_from_response(json!({"message": "nope"})), None);
        assert!(league_detail_from_response(json!({"league": {}, "teams": []})).is_some());
    }

    #[test]
    fn test_parse_detail_and_picks() {
        let detail: LeagueDetail = serde_json::from_value(json!({
            "league": {"name": "RotoWire Online Championship #12", "rosterSize": "20", "3rr": 1,
                       "draft_date": "2024-08-20 20:00:00", "draft_completed_date": ""},
            "teams": [{"id": "9", "draft_order": 3, "league_rank": "1", "league_points": "101.5",
                       "overall_rank": 12, "overall_points": 2831.25}]
        }))
        .unwrap();
        assert_eq!(detail.league.roster_size, Some(20));
        assert!(detail.league.has_third_round_reversal());
        assert_eq!(detail.league.draft_completed_date, None);
        assert_eq!(detail.teams[0].id, 9);
        assert_eq!(detail.teams[0].league_points, Some(101.5));

        let pick: NffcPick = serde_json::from_value(json!({
            "round": 2, "pick": 14, "team": "7", "player": "sr-uuid", "timestamp": 1724198400
        }))
        .unwrap();
        assert_eq!(pick.team, 7);
        assert_eq!(pick.timestamp.as_deref(), Some("1724198400"));
        assert_eq!(pick.pick_duration, None);
    }

    #[test]
    fn test_league_cache_keeps_unknown_fields() {
        let league: NffcLeague =
            serde_json::from_value(json!({"id": 5, "name": "Rotowire Online #1", "entry_fee": 350})).unwrap();
        assert!(league.is_rotowire_online());
        assert_eq!(serde_json::to_value(&league).unwrap()["entry_fee"], 350);
    }

    #[test]
    fn test_requires_key() {
        assert!(matches!(NffcClient::new(" ", 2025), Err(FeedError::MissingApiKey(_))));
    }
}

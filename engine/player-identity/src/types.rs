use crate::normalize::{normalize_name, normalize_position};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A row of the canonical `players` table
///
/// Only the identity columns are typed. Whatever else a query selected
/// (vendor IDs, height, headshot_url, ...) is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    /// Canonical ID (Sportradar UUID)
    pub player_id: String,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    /// Position (e.g., "QB", "RB", "WR", "TE", "K")
    #[serde(default)]
    pub position: Option<String>,

    /// Team abbreviation (e.g., "BAL"), None for free agents
    #[serde(default)]
    pub latest_team: Option<String>,

    /// Any other selected columns
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayerRow {
    /// Create a row with the identity columns set
    pub fn new(player_id: &str, first_name: &str, last_name: &str, position: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            position: Some(position.to_string()),
            ..Self::default()
        }
    }

    /// Builder-style setter for an extra column
    pub fn with_column(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(column.to_string(), value.into());
        self
    }

    /// "First Last", trimmed
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.full_name())
    }

    /// Uppercase position, empty when unknown
    pub fn position_code(&self) -> String {
        normalize_position(self.position.as_deref().unwrap_or(""))
    }

    pub fn team(&self) -> &str {
        self.latest_team.as_deref().map(str::trim).unwrap_or("")
    }

    /// Read any column as a non-empty string
    ///
    /// Numbers are rendered without decoration, null and empty strings are
    /// treated as missing.
    pub fn column(&self, name: &str) -> Option<String> {
        let typed = match name {
            "player_id" => Some(self.player_id.clone()),
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "position" => self.position.clone(),
            "latest_team" => self.latest_team.clone(),
            _ => return self.extra.get(name).and_then(value_as_string),
        };
        typed.filter(|v| !v.trim().is_empty())
    }

    /// True when the column holds a non-empty value
    pub fn has(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Render a JSON scalar as an ID string
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Errors that can occur during identity lookups
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// Player not found in the index
    #[error("Player '{0}' not found in index")]
    PlayerNotFound(String),

    /// A matched-IDs document could not be parsed
    #[error("Invalid matched IDs file: {0}")]
    InvalidMatchedFile(String),
}

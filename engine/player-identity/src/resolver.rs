//! The match cascade: primary ID, secondary IDs, name + position, name

use crate::index::PlayerIndex;
use crate::normalize::{normalize_name, normalize_position};
use crate::types::PlayerRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when only the name matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameFallback {
    /// Accept the name-only candidate
    #[default]
    Any,
    /// Accept only when the candidate plays the queried position
    SamePosition,
    /// Never fall back to name-only
    Disabled,
}

/// Which step of the cascade produced the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    PrimaryId,
    SecondaryId(String),
    NamePosition,
    NameOnly,
}

impl MatchMethod {
    pub fn is_primary(&self) -> bool {
        matches!(self, MatchMethod::PrimaryId)
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::PrimaryId => write!(f, "sportradar"),
            MatchMethod::SecondaryId(column) => write!(f, "{column}"),
            MatchMethod::NamePosition => write!(f, "name_pos"),
            MatchMethod::NameOnly => write!(f, "name_only"),
        }
    }
}

/// An external record to resolve
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    primary_id: Option<String>,
    secondary: Vec<(String, String)>,
    name: String,
    position: Option<String>,
}

impl MatchQuery {
    pub fn by_name(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    /// Set the position; blank positions are ignored
    pub fn position(mut self, position: &str) -> Self {
        let pos = normalize_position(position);
        self.position = (!pos.is_empty()).then_some(pos);
        self
    }

    /// Set the Sportradar UUID carried by the record
    pub fn primary_id(mut self, id: Option<&str>) -> Self {
        self.primary_id = id.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        self
    }

    /// Append a secondary ID; tried in insertion order
    pub fn secondary(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.secondary.push((column.to_string(), value.to_string()));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub player: &'a PlayerRow,
    pub method: MatchMethod,
}

/// Runs the cascade against an index
pub struct Resolver<'a> {
    index: &'a PlayerIndex,
    fallback: NameFallback,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a PlayerIndex, fallback: NameFallback) -> Self {
        Self { index, fallback }
    }

    pub fn resolve(&self, query: &MatchQuery) -> Option<Resolution<'a>> {
        if let Some(id) = &query.primary_id {
            if let Ok(player) = self.index.get_by_id(id) {
                return Some(Resolution { player, method: MatchMethod::PrimaryId });
            }
        }

        for (column, value) in &query.secondary {
            if let Some(player) = self.index.by_secondary(column, value) {
                return Some(Resolution {
                    player,
                    method: MatchMethod::SecondaryId(column.clone()),
                });
            }
        }

        let name = normalize_name(&query.name);
        if name.is_empty() {
            return None;
        }

        if let Some(pos) = &query.position {
            if let Some(player) = self.index.by_name_pos(&name, pos) {
                return Some(Resolution { player, method: MatchMethod::NamePosition });
            }
        }

        let player = self.index.by_name(&name)?;
        let accepted = match self.fallback {
            NameFallback::Any => true,
            NameFallback::SamePosition => {
                query.position.as_deref() == Some(player.position_code().as_str())
            }
            NameFallback::Disabled => false,
        };
        accepted.then_some(Resolution { player, method: MatchMethod::NameOnly })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PlayerIndex {
        PlayerIndex::build(vec![
            PlayerRow::new("sr-1", "Josh", "Allen", "QB").with_column("sleeper_id", "4984"),
            PlayerRow::new("sr-2", "Travis", "Etienne Jr.", "RB"),
            PlayerRow::new("sr-3", "Taysom", "Hill", "TE").with_column("sportsdata_id", "17920"),
        ])
        .with_secondary_ids(&["sleeper_id", "sportsdata_id"])
    }

    #[test]
    fn test_primary_id_wins() {
        let index = index();
        let resolver = Resolver::new(&index, NameFallback::Any);
        let query = MatchQuery::by_name("Someone Else").position("RB").primary_id(Some("sr-1"));
        let hit = resolver.resolve(&query).unwrap();
        assert_eq!(hit.player.player_id, "sr-1");
        assert_eq!(hit.method, MatchMethod::PrimaryId);
    }

    #[test]
    fn test_unknown_primary_falls_through_to_secondary() {
        let index = index();
        let resolver = Resolver::new(&index, NameFallback::Any);
        let query = MatchQuery::by_name("")
            .primary_id(Some("not-in-db"))
            .secondary("sleeper_id", Some("9999"))
            .secondary("sportsdata_id", Some("17920"));
        let hit = resolver.resolve(&query).unwrap();
        assert_eq!(hit.player.player_id, "sr-3");
        assert_eq!(hit.method, MatchMethod::SecondaryId("sportsdata_id".to_string()));
    }

    #[test]
    fn test_name_position_then_name_only() {
        let index = index();
        let resolver = Resolver::new(&index, NameFallback::Any);

        let hit = resolver.resolve(&MatchQuery::by_name("Travis Etienne").position("rb")).unwrap();
        assert_eq!(hit.method, MatchMethod::NamePosition);

        // Taysom Hill listed as QB by some vendors
        let hit = resolver.resolve(&MatchQuery::by_name("Taysom Hill").position("QB")).unwrap();
        assert_eq!(hit.player.player_id, "sr-3");
        assert_eq!(hit.method, MatchMethod::NameOnly);
    }

    #[test]
    fn test_same_position_fallback_rejects_mismatch() {
        let index = index();
        let resolver = Resolver::new(&index, NameFallback::SamePosition);
        assert!(resolver.resolve(&MatchQuery::by_name("Taysom Hill").position("QB")).is_none());
        assert!(resolver.resolve(&MatchQuery::by_name("Taysom Hill")).is_none());
    }

    #[test]
    fn test_disabled_fallback_and_blank_name() {
        let index = index();
        let resolver = Resolver::new(&index, NameFallback::Disabled);
        assert!(resolver.resolve(&MatchQuery::by_name("Josh Allen")).is_none());
        assert!(resolver.resolve(&MatchQuery::by_name("  ").position("QB")).is_none());
    }
}

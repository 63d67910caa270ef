use crate::resolver::MatchMethod;
use crate::types::IdentityError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What `MatchedIds::record` did with an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First match for this player
    Inserted,
    /// A primary-ID match replaced an earlier name-based one
    Replaced,
    /// Only columns that were still missing were added
    Filled,
    /// Nothing to record (all values empty)
    Ignored,
}

/// Accumulates `player_id -> {column -> value}` for one source
///
/// Serializes as the plain JSON object stored in `data/matched/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchedIds {
    entries: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(skip)]
    methods: HashMap<String, MatchMethod>,
}

impl MatchedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(json).map_err(|e| IdentityError::InvalidMatchedFile(e.to_string()))
    }

    /// Record a match for `player_id`
    ///
    /// A primary-ID match replaces an earlier name-based match; otherwise
    /// existing values win and only missing columns are filled.
    pub fn record<I, K, V>(&mut self, player_id: &str, updates: I, method: MatchMethod) -> RecordOutcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let updates: BTreeMap<String, String> = updates
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        if updates.is_empty() {
            return RecordOutcome::Ignored;
        }

        let previous_by_name = matches!(
            self.methods.get(player_id),
            Some(MatchMethod::NamePosition) | Some(MatchMethod::NameOnly)
        );

        let Some(current) = self.entries.get_mut(player_id) else {
            self.entries.insert(player_id.to_string(), updates);
            self.methods.insert(player_id.to_string(), method);
            return RecordOutcome::Inserted;
        };

        if method.is_primary() && previous_by_name {
            *current = updates;
            self.methods.insert(player_id.to_string(), method);
            return RecordOutcome::Replaced;
        }

        for (column, value) in updates {
            current.entry(column).or_insert(value);
        }
        RecordOutcome::Filled
    }

    /// Add missing columns only, never overwriting
    ///
    /// Returns the number of columns added.
    pub fn fill_gaps<I, K, V>(&mut self, player_id: &str, updates: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut added = 0;
        for (column, value) in updates {
            let value = value.into().trim().to_string();
            if value.is_empty() {
                continue;
            }
            let entry = self.entries.entry(player_id.to_string()).or_default();
            if let std::collections::btree_map::Entry::Vacant(slot) = entry.entry(column.into()) {
                slot.insert(value);
                added += 1;
            }
        }
        added
    }

    /// Merge another source in; the first source to supply a column wins
    ///
    /// Columns outside `allowed` are dropped. Returns the number of new
    /// `(player, column)` pairs taken from `other`.
    pub fn merge_first_wins(&mut self, other: &MatchedIds, allowed: &[&str]) -> usize {
        let mut taken = 0;
        for (player_id, columns) in &other.entries {
            for (column, value) in columns {
                if !allowed.contains(&column.as_str()) || value.is_empty() {
                    continue;
                }
                let entry = self.entries.entry(player_id.clone()).or_default();
                if !entry.contains_key(column) {
                    entry.insert(column.clone(), value.clone());
                    taken += 1;
                }
            }
        }
        taken
    }

    pub fn get(&self, player_id: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(player_id)
    }

    pub fn method(&self, player_id: &str) -> Option<&MatchMethod> {
        self.methods.get(player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.contains_key(player_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted set of every column present
    pub fn columns(&self) -> BTreeSet<String> {
        self.entries.values().flat_map(|cols| cols.keys().cloned()).collect()
    }

    /// Number of players carrying `column`
    pub fn column_count(&self, column: &str) -> usize {
        self.entries.values().filter(|cols| cols.contains_key(column)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_then_fill() {
        let mut matched = MatchedIds::new();
        let outcome = matched.record("p1", [("sleeper_id", "1"), ("espn_id", "")], MatchMethod::NameOnly);
        assert_eq!(outcome, RecordOutcome::Inserted);
        assert_eq!(matched.get("p1").unwrap().len(), 1);

        let outcome = matched.record(
            "p1",
            [("sleeper_id", "2"), ("espn_id", "77")],
            MatchMethod::NamePosition,
        );
        assert_eq!(outcome, RecordOutcome::Filled);
        let cols = matched.get("p1").unwrap();
        assert_eq!(cols["sleeper_id"], "1");
        assert_eq!(cols["espn_id"], "77");
    }

    #[test]
    fn test_primary_replaces_name_match() {
        let mut matched = MatchedIds::new();
        matched.record("p1", [("sleeper_id", "1"), ("yahoo_id", "9")], MatchMethod::NamePosition);
        let outcome = matched.record("p1", [("sleeper_id", "2")], MatchMethod::PrimaryId);
        assert_eq!(outcome, RecordOutcome::Replaced);
        assert_eq!(matched.get("p1").unwrap().get("yahoo_id"), None);
        assert_eq!(matched.get("p1").unwrap()["sleeper_id"], "2");

        // A second primary match does not replace the first
        let outcome = matched.record("p1", [("sleeper_id", "3")], MatchMethod::PrimaryId);
        assert_eq!(outcome, RecordOutcome::Filled);
        assert_eq!(matched.get("p1").unwrap()["sleeper_id"], "2");
    }

    #[test]
    fn test_empty_updates_ignored() {
        let mut matched = MatchedIds::new();
        let outcome = matched.record("p1", [("sleeper_id", " ")], MatchMethod::PrimaryId);
        assert_eq!(outcome, RecordOutcome::Ignored);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_merge_first_source_wins() {
        let mut merged = MatchedIds::new();
        let mut first = MatchedIds::new();
        first.record("p1", [("mfl_id", "10")], MatchMethod::PrimaryId);
        let mut second = MatchedIds::new();
        second.record("p1", [("mfl_id", "20"), ("sleeper_id", "5"), ("bogus", "x")], MatchMethod::PrimaryId);

        assert_eq!(merged.merge_first_wins(&first, &["mfl_id", "sleeper_id"]), 1);
        assert_eq!(merged.merge_first_wins(&second, &["mfl_id", "sleeper_id"]), 1);

        let cols = merged.get("p1").unwrap();
        assert_eq!(cols["mfl_id"], "10");
        assert_eq!(cols["sleeper_id"], "5");
        assert!(!cols.contains_key("bogus"));
        assert_eq!(merged.column_count("mfl_id"), 1);
    }

    #[test]
    fn test_json_shape() {
        let mut matched = MatchedIds::new();
        matched.record("p1", [("sleeper_id", "1")], MatchMethod::PrimaryId);
        let json = serde_json::to_string(&matched).unwrap();
        assert_eq!(json, r#"{"p1":{"sleeper_id":"1"}}"#);

        let parsed = MatchedIds::from_json(&json).unwrap();
        assert_eq!(parsed.get("p1").unwrap()["sleeper_id"], "1");
        assert!(MatchedIds::from_json("[1,2]").is_err());
    }

    #[test]
    fn test_fill_gaps() {
        let mut matched = MatchedIds::new();
        matched.record("p1", [("sportsdata_id", "1")], MatchMethod::NamePosition);
        assert_eq!(matched.fill_gaps("p1", [("sportsdata_id", "2"), ("fanduel_id", "3")]), 1);
        assert_eq!(matched.fill_gaps("p2", [("sportsdata_id", "4")]), 1);
        assert_eq!(matched.get("p1").unwrap()["sportsdata_id"], "1");
        assert_eq!(matched.len(), 2);
    }
}

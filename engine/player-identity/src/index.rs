use crate::aliases::alias_for;
use crate::types::{IdentityError, PlayerRow};
use std::collections::HashMap;
use tracing::debug;

/// Player Index - in-memory lookup tables over the `players` table
///
/// Built once per run from a full `players` read. Every map stores an
/// index into `players`, so rows are never cloned.
#[derive(Debug, Default, Clone)]
pub struct PlayerIndex {
    players: Vec<PlayerRow>,

    /// player_id -> row
    by_id: HashMap<String, usize>,

    /// (normalized name, position) -> row
    by_name_pos: HashMap<(String, String), usize>,

    /// normalized name -> row; last one indexed wins
    by_name: HashMap<String, usize>,

    /// column -> (value -> row)
    secondary: HashMap<String, HashMap<String, usize>>,
}

impl PlayerIndex {
    /// Index rows by ID and by (alias-aware) name
    pub fn build(players: Vec<PlayerRow>) -> Self {
        let mut index = Self { players, ..Self::default() };

        for (i, player) in index.players.iter().enumerate() {
            index.by_id.insert(player.player_id.clone(), i);

            let name = player.normalized_name();
            if name.is_empty() {
                continue;
            }
            let pos = player.position_code();

            index.by_name_pos.insert((name.clone(), pos.clone()), i);
            index.by_name.insert(name.clone(), i);

            if let Some(alias) = alias_for(&name) {
                index.by_name_pos.insert((alias.to_string(), pos), i);
                index.by_name.insert(alias.to_string(), i);
            }
        }

        debug!(
            players = index.players.len(),
            names = index.by_name.len(),
            "Built player index"
        );
        index
    }

    /// Add secondary ID indexes for the given columns
    ///
    /// Empty values and the MFL placeholder "0" are skipped.
    pub fn with_secondary_ids(mut self, columns: &[&str]) -> Self {
        for column in columns {
            let mut values = HashMap::new();
            for (i, player) in self.players.iter().enumerate() {
                if let Some(value) = player.column(column) {
                    if *column == "mfl_id" && value == "0" {
                        continue;
                    }
                    values.insert(value, i);
                }
            }
            self.secondary.insert(column.to_string(), values);
        }
        self
    }

    /// Get a player by canonical ID
    pub fn get_by_id(&self, player_id: &str) -> Result<&PlayerRow, IdentityError> {
        self.by_id
            .get(player_id)
            .map(|&i| &self.players[i])
            .ok_or_else(|| IdentityError::PlayerNotFound(player_id.to_string()))
    }

    pub fn contains_id(&self, player_id: &str) -> bool {
        self.by_id.contains_key(player_id)
    }

    /// Lookup by already-normalized name and position
    pub fn by_name_pos(&self, name: &str, position: &str) -> Option<&PlayerRow> {
        self.by_name_pos
            .get(&(name.to_string(), position.to_string()))
            .map(|&i| &self.players[i])
    }

    /// Lookup by already-normalized name
    pub fn by_name(&self, name: &str) -> Option<&PlayerRow> {
        self.by_name.get(name).map(|&i| &self.players[i])
    }

    /// Lookup by a secondary ID column; None if the column was not indexed
    pub fn by_secondary(&self, column: &str, value: &str) -> Option<&PlayerRow> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        self.secondary.get(column)?.get(value).map(|&i| &self.players[i])
    }

    pub fn players(&self) -> &[PlayerRow] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

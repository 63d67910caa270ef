use crate::normalize::{normalize_name, normalize_position};
use std::collections::HashMap;

/// Name lookup over records that are not DB players
///
/// Used for side sources (nflreadr, SportsData cache, DraftKings and
/// Drafters exports) that are searched by name + position, then name.
/// Later records win on a key collision.
#[derive(Debug, Clone)]
pub struct NameTable<T> {
    records: Vec<T>,
    by_name_pos: HashMap<(String, String), usize>,
    by_name: HashMap<String, usize>,
}

impl<T> NameTable<T> {
    /// Index `records` by the `(name, position)` the closure extracts
    pub fn build<F>(records: Vec<T>, key: F) -> Self
    where
        F: Fn(&T) -> (String, String),
    {
        let mut by_name_pos = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            let (name, position) = key(record);
            let name = normalize_name(&name);
            if name.is_empty() {
                continue;
            }
            by_name_pos.insert((name.clone(), normalize_position(&position)), i);
            by_name.insert(name, i);
        }
        Self { records, by_name_pos, by_name }
    }

    /// Name + position first, then name alone
    pub fn find(&self, name: &str, position: &str) -> Option<&T> {
        let name = normalize_name(name);
        if name.is_empty() {
            return None;
        }
        self.by_name_pos
            .get(&(name.clone(), normalize_position(position)))
            .or_else(|| self.by_name.get(&name))
            .map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for NameTable<T> {
    fn default() -> Self {
        Self { records: Vec::new(), by_name_pos: HashMap::new(), by_name: HashMap::new() }
    }
}

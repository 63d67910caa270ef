//! Per-source match results under `data/matched/`

use crate::layout::{read_json_if_exists, write_json, DataLayout};
use anyhow::Result;
use player_identity::MatchedIds;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Every ID column `ids apply` may write to `players`
pub const ALL_ID_COLUMNS: [&str; 24] = [
    "gsis_id",
    "espn_id",
    "yahoo_id",
    "sleeper_id",
    "pfr_id",
    "rotowire_id",
    "pff_id",
    "fantasypros_id",
    "mfl_id",
    "stats_id",
    "stats_global_id",
    "fantasy_data_id",
    "cbs_id",
    "fleaflicker_id",
    "swish_id",
    "ktc_id",
    "cfbref_id",
    "rotoworld_id",
    "sportsdata_id",
    "footballguys_id",
    "fanduel_id",
    "draftkings_id",
    "underdog_id",
    "drafters_id",
];

pub const SPORTSDATA_CACHE: &str = "sportsdata_players_cache.json";
pub const SLEEPER_CACHE: &str = "sleeper_players_cache.json";
pub const SPORTSDATA_UNMATCHED_ROOKIES: &str = "sportsdata_unmatched_rookies.json";
pub const SLEEPER_UNMATCHED_ROOKIES: &str = "sleeper_unmatched_rookies.json";
pub const UNDERDOG_UNMATCHED: &str = "underdog_unmatched.json";
pub const UPDATE_IDS_SQL: &str = "update_ids.sql";
pub const INSERT_MISSING_SQL: &str = "insert_missing_players.sql";

/// A source that produces a `<source>_ids.json` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchedSource {
    Nflreadr,
    SportsData,
    Sleeper,
    Underdog,
    DraftKings,
    Drafters,
    Footballguys,
}

impl MatchedSource {
    /// Merge order for `ids apply`: earlier sources win a column
    pub const PRIORITY: [MatchedSource; 7] = [
        MatchedSource::Nflreadr,
        MatchedSource::SportsData,
        MatchedSource::Sleeper,
        MatchedSource::Underdog,
        MatchedSource::DraftKings,
        MatchedSource::Drafters,
        MatchedSource::Footballguys,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            MatchedSource::Nflreadr => "nflreadr_ids.json",
            MatchedSource::SportsData => "sportsdata_ids.json",
            MatchedSource::Sleeper => "sleeper_ids.json",
            MatchedSource::Underdog => "underdog_ids.json",
            MatchedSource::DraftKings => "dk_ids.json",
            MatchedSource::Drafters => "drafters_ids.json",
            MatchedSource::Footballguys => "fbg_ids.json",
        }
    }

    pub fn path(self, layout: &DataLayout) -> PathBuf {
        layout.matched_file(self.file_name())
    }
}

impl fmt::Display for MatchedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.file_name().trim_end_matches("_ids.json");
        write!(f, "{name}")
    }
}

/// Load a matched file; `None` when the source has not been matched yet
pub fn load_matched(layout: &DataLayout, source: MatchedSource) -> Result<Option<MatchedIds>> {
    read_json_if_exists(&source.path(layout))
}

pub fn save_matched(layout: &DataLayout, source: MatchedSource, ids: &MatchedIds) -> Result<PathBuf> {
    let path = source.path(layout);
    write_json(&path, ids)?;
    info!(source = %source, players = ids.len(), "Saved {}", path.display());
    Ok(path)
}

/// Merge every available matched file in priority order
///
/// Returns the merged IDs and the sources that were found.
pub fn merge_all(layout: &DataLayout) -> Result<(MatchedIds, Vec<MatchedSource>)> {
    let mut merged = MatchedIds::new();
    let mut found = Vec::new();
    for source in MatchedSource::PRIORITY {
        match load_matched(layout, source)? {
            Some(ids) => {
                let taken = merged.merge_first_wins(&ids, &ALL_ID_COLUMNS);
                info!(source = %source, players = ids.len(), taken, "Merged matched file");
                found.push(source);
            }
            None => info!(source = %source, "No matched file, skipping"),
        }
    }
    Ok((merged, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_identity::MatchMethod;

    #[test]
    fn test_merge_all_respects_priority() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());

        let mut nflreadr = MatchedIds::new();
        nflreadr.record("p1", [("mfl_id", "111")], MatchMethod::PrimaryId);
        save_matched(&layout, MatchedSource::Nflreadr, &nflreadr).unwrap();

        let mut fbg = MatchedIds::new();
        fbg.record("p1", [("mfl_id", "999"), ("footballguys_id", "ChaseJa00")], MatchMethod::NameOnly);
        fbg.record("p2", [("not_an_id", "x")], MatchMethod::NameOnly);
        save_matched(&layout, MatchedSource::Footballguys, &fbg).unwrap();

        let (merged, found) = merge_all(&layout).unwrap();
        assert_eq!(found, vec![MatchedSource::Nflreadr, MatchedSource::Footballguys]);

        let p1 = merged.get("p1").unwrap();
        assert_eq!(p1["mfl_id"], "111");
        assert_eq!(p1["footballguys_id"], "ChaseJa00");
        assert!(merged.get("p2").is_none());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(MatchedSource::DraftKings.to_string(), "dk");
        assert_eq!(MatchedSource::Footballguys.to_string(), "fbg");
        assert_eq!(MatchedSource::PRIORITY[0], MatchedSource::Nflreadr);
    }
}

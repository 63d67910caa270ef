//! nflreadr CSV exports in `data/nflreadr/`
//!
//! The R exports write `NA` for missing values; records read here expose
//! those cells as empty.

use crate::csv_files::{read_csv, read_headers};
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const FF_PLAYERIDS_CSV: &str = "ff_playerids.csv";
pub const PLAYERS_CSV: &str = "players.csv";
pub const PLAYER_STATS_CSV: &str = "player_stats.csv";
pub const TEAM_GAME_STATS_CSV: &str = "team_game_stats.csv";
pub const TEAMS_CSV: &str = "teams.csv";

/// One CSV row keyed by header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NflreadrRecord {
    fields: HashMap<String, String>,
}

impl NflreadrRecord {
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(k, v)| if v == "NA" { (k, String::new()) } else { (k, v) })
            .collect();
        Self { fields }
    }

    /// Cell text, empty when missing or `NA`
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or_default()
    }

    /// Cell text, `None` when missing or `NA`
    pub fn opt(&self, column: &str) -> Option<&str> {
        Some(self.get(column)).filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}

/// Read any nflreadr-style CSV
pub fn read_records(path: &Path) -> Result<Vec<NflreadrRecord>> {
    let raw: Vec<HashMap<String, String>> = read_csv(path)?;
    Ok(raw.into_iter().map(NflreadrRecord::from_fields).collect())
}

/// The nflreadr export directory
#[derive(Debug, Clone)]
pub struct NflreadrDir {
    dir: PathBuf,
}

impl NflreadrDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Cross-vendor ID map, keyed on `sportradar_id` by callers
    pub fn ff_playerids(&self) -> Result<Vec<NflreadrRecord>> {
        read_records(&self.path(FF_PLAYERIDS_CSV))
    }

    /// Player bios keyed on `gsis_id`
    pub fn players(&self) -> Result<Vec<NflreadrRecord>> {
        read_records(&self.path(PLAYERS_CSV))
    }

    pub fn player_stats(&self) -> Result<Vec<NflreadrRecord>> {
        read_records(&self.path(PLAYER_STATS_CSV))
    }

    pub fn team_game_stats(&self) -> Result<Vec<NflreadrRecord>> {
        read_records(&self.path(TEAM_GAME_STATS_CSV))
    }

    pub fn teams(&self) -> Result<Vec<NflreadrRecord>> {
        read_records(&self.path(TEAMS_CSV))
    }

    /// Header of one of the exports
    pub fn headers(&self, file: &str) -> Result<Vec<String>> {
        read_headers(&self.path(file))
    }

    /// Index records by a column, skipping blank keys; later rows win
    pub fn index_by(records: Vec<NflreadrRecord>, column: &str) -> HashMap<String, NflreadrRecord> {
        records
            .into_iter()
            .filter_map(|r| r.opt(column).map(str::to_string).map(|key| (key, r)))
            .collect()
    }
}

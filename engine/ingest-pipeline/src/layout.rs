//! Data directory layout and flat-file helpers
//!
//! ```text
//! data/
//!   imports/      hand-exported CSVs
//!   nflreadr/     nflreadr CSV exports
//!   matched/      <source>_ids.json, vendor caches, generated SQL
//!   raw/          NFFC league lists, drafts, league details, ADP
//!   clean/        NFFC CSVs ready to load
//!   logs/         append-only run logs
//!   writeups/     player_writeups.yaml
//! ```

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Paths under the data directory
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn imports(&self) -> PathBuf {
        self.root.join("imports")
    }

    pub fn nflreadr(&self) -> PathBuf {
        self.root.join("nflreadr")
    }

    pub fn matched(&self) -> PathBuf {
        self.root.join("matched")
    }

    /// File under `matched/`
    pub fn matched_file(&self, name: &str) -> PathBuf {
        self.matched().join(name)
    }

    pub fn raw(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// `raw/historical_leagues_<year>.json`
    pub fn nffc_leagues_file(&self, year: i32) -> PathBuf {
        self.raw().join(format!("historical_leagues_{year}.json"))
    }

    /// `raw/drafts/drafts_<year>.json`
    pub fn nffc_drafts_file(&self, year: i32) -> PathBuf {
        self.raw().join("drafts").join(format!("drafts_{year}.json"))
    }

    /// `raw/league_details/league_details_<year>.json`
    pub fn nffc_details_file(&self, year: i32) -> PathBuf {
        self.raw().join("league_details").join(format!("league_details_{year}.json"))
    }

    /// `raw/adp/adp_<year>.json`
    pub fn nffc_adp_file(&self, year: i32) -> PathBuf {
        self.raw().join("adp").join(format!("adp_{year}.json"))
    }

    pub fn clean(&self) -> PathBuf {
        self.root.join("clean")
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn writeups_file(&self) -> PathBuf {
        self.root.join("writeups").join("player_writeups.yaml")
    }

    pub fn dynasty_export_file(&self) -> PathBuf {
        self.root.join("dynasty_values_with_adp.csv")
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read a JSON file, or `None` when it does not exist
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

/// Pretty-printed JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Append one JSON line
pub fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

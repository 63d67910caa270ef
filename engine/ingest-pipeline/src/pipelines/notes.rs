//! `notes push`: player writeups from YAML into `player_notes`

use crate::context::IngestContext;
use crate::report::Summary;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use supabase_rest::{row, Row, UpsertOptions};
use tracing::{info, warn};

pub const NOTES_TABLE: &str = "player_notes";
pub const NOTES_BATCH_SIZE: usize = 100;
const PREVIEW_COUNT: usize = 10;
const PREVIEW_CHARS: usize = 80;

/// One entry of `player_writeups.yaml`; name, position and team are for the editor
#[derive(Debug, Clone, Deserialize)]
pub struct Writeup {
    pub player_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub writeup: Option<String>,
}

impl Writeup {
    pub fn text(&self) -> Option<&str> {
        self.writeup.as_deref().map(str::trim).filter(|w| !w.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WriteupFile {
    List(Vec<Writeup>),
    Keyed { players: Vec<Writeup> },
}

/// Read the writeups file, a bare list or a `players:` list
pub fn read_writeups(path: &Path) -> Result<Vec<Writeup>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: WriteupFile =
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(match file {
        WriteupFile::List(writeups) | WriteupFile::Keyed { players: writeups } => writeups,
    })
}

/// `player_notes` rows for entries with a writeup
pub fn note_rows(writeups: &[Writeup]) -> Vec<Row> {
    writeups
        .iter()
        .filter(|w| !w.player_id.trim().is_empty())
        .filter_map(|w| w.text().map(|text| row([("player_id", json!(w.player_id.trim())), ("writeup", json!(text))])))
        .collect()
}

fn preview(note: &Row) -> String {
    let player_id = note.get("player_id").and_then(|v| v.as_str()).unwrap_or_default();
    let text = note.get("writeup").and_then(|v| v.as_str()).unwrap_or_default();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}: {}...", player_id, text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        format!("{}: {}", player_id, text)
    }
}

pub async fn run(ctx: &IngestContext, dry_run: bool) -> Result<Summary> {
    let path = ctx.layout.writeups_file();
    info!("Reading {}...", path.display());
    let writeups = read_writeups(&path)?;
    let notes = note_rows(&writeups);

    let mut summary = Summary::new("PLAYER NOTES PUSH")
        .row("Total entries", writeups.len())
        .row("With writeups", notes.len())
        .row("Skipped (empty)", writeups.len() - notes.len());
    if notes.is_empty() {
        warn!("No writeups to push");
        return Ok(summary);
    }

    if dry_run {
        let mut lines: Vec<String> = notes.iter().take(PREVIEW_COUNT).map(preview).collect();
        if notes.len() > PREVIEW_COUNT {
            lines.push(format!("... and {} more", notes.len() - PREVIEW_COUNT));
        }
        return Ok(summary.section(&format!("[DRY RUN] Would upsert {} writeups", notes.len()), lines));
    }

    info!("Upserting {} writeups to {}...", notes.len(), NOTES_TABLE);
    let result = ctx
        .store()
        .upsert(NOTES_TABLE, notes, UpsertOptions::batch(NOTES_BATCH_SIZE).on_conflict(&["player_id"]))
        .await
        .context("Failed to upsert player notes")?;
    for error in &result.errors {
        warn!(offset = error.offset, "Batch failed: {}", error.message);
    }
    summary.push_row("Upserted", result.written);
    summary.push_row("Errors", result.failed);
    Ok(summary)
}

//! `headshots upload <dir>`: rookie headshots into Supabase Storage

use crate::context::IngestContext;
use crate::players::patch_players;
use crate::report::{truncated, Summary};
use anyhow::{bail, Context, Result};
use player_identity::normalize_name;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supabase_rest::{row, select_as, BucketSpec, ObjectStorage, Select};
use tracing::{info, warn};

pub const HEADSHOT_BUCKET: &str = "headshots";

#[derive(Debug, Deserialize)]
struct EmbeddedPlayer {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    headshot_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DynastyPlayer {
    player_id: String,
    players: Option<EmbeddedPlayer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingHeadshot {
    pub player_id: String,
    pub name: String,
    pub file: PathBuf,
}

/// Normalized file stem -> path for every `.png` in `dir`
pub fn png_files(dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let mut files = HashMap::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Headshots directory not found: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if !is_png {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.insert(normalize_name(stem), path.clone());
        }
    }
    Ok(files)
}

fn storage_path(player_id: &str) -> String {
    format!("rookies/{player_id}.png")
}

pub async fn run(ctx: &IngestContext, storage: &dyn ObjectStorage, dir: &Path) -> Result<Summary> {
    let files = png_files(dir)?;
    info!("Found {} PNG files in {}", files.len(), dir.display());

    let query = Select::table("dynasty_values")
        .columns(&["player_id", "players(first_name,last_name,position,headshot_url)"]);
    let dynasty: Vec<DynastyPlayer> = select_as(ctx.store(), &query)
        .await
        .context("Failed to fetch dynasty value players")?;
    info!("{} dynasty value players", dynasty.len());

    let mut pending = Vec::new();
    for dv in dynasty {
        let Some(player) = dv.players else { continue };
        if player.headshot_url.as_deref().is_some_and(|u| !u.is_empty()) {
            continue;
        }
        let name = format!(
            "{} {}",
            player.first_name.as_deref().unwrap_or_default(),
            player.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();
        if let Some(file) = files.get(&normalize_name(&name)) {
            pending.push(PendingHeadshot { player_id: dv.player_id, name, file: file.clone() });
        }
    }
    pending.sort_by(|a, b| a.name.cmp(&b.name));
    info!("{} players need headshots and have matching files", pending.len());

    let summary = Summary::new("HEADSHOT UPLOAD")
        .row("PNG files available", files.len())
        .row("Players needing shots", pending.len());
    if pending.is_empty() {
        return Ok(summary.row("Uploaded & updated", 0));
    }

    storage
        .ensure_bucket(&BucketSpec::public_images(HEADSHOT_BUCKET))
        .await
        .context("Failed to create headshots bucket")?;

    let mut updates = Vec::new();
    let mut errors = Vec::new();
    for item in &pending {
        let path = storage_path(&item.player_id);
        let bytes = match tokio::fs::read(&item.file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(format!("{}: {}", item.name, e));
                continue;
            }
        };
        match storage.upload(HEADSHOT_BUCKET, &path, "image/png", bytes).await {
            Ok(()) => {
                let url = storage.public_url(HEADSHOT_BUCKET, &path);
                updates.push((item.player_id.clone(), row([("headshot_url", json!(url))])));
            }
            Err(e) => {
                warn!(player = %item.name, error = %e, "Upload failed");
                errors.push(format!("{}: {}", item.name, e));
            }
        }
    }

    let outcome = patch_players(ctx.store(), updates).await;
    errors.extend(outcome.failed.iter().map(|(pid, e)| format!("{pid}: {e}")));
    if outcome.applied == 0 && !errors.is_empty() {
        bail!("No headshots uploaded: {}", errors.join("; "));
    }

    Ok(summary
        .row("Uploaded & updated", outcome.applied)
        .row("Errors", errors.len())
        .section("Errors", truncated(errors, 10)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players, with, write_file};
    use supabase_rest::{MemoryStorage, MemoryStore};

    #[tokio::test]
    async fn test_uploads_missing_headshots_only() {
        let dir = tempfile::tempdir().unwrap();
        let shots = dir.path().join("shots");
        write_file(&shots.join("Ashton Jeanty.png"), "png-a");
        write_file(&shots.join("Travis Hunter.PNG"), "png-t");
        write_file(&shots.join("Cam Ward.png"), "png-c");
        write_file(&shots.join("notes.txt"), "ignored");

        let store = store_with_players(vec![
            player("p-jeanty", "Ashton", "Jeanty", "RB", "LV"),
            player("p-hunter", "Travis", "Hunter", "WR", "JAX"),
            with(player("p-ward", "Cam", "Ward", "QB", "TEN"), "headshot_url", json!("https://x/ward.png")),
        ])
        .await;
        store
            .insert_rows(
                "dynasty_values",
                vec![
                    row([("player_id", json!("p-jeanty")), ("value", json!(60))]),
                    row([("player_id", json!("p-hunter")), ("value", json!(55))]),
                    row([("player_id", json!("p-ward")), ("value", json!(40))]),
                ],
            )
            .await;
        let ctx = context(dir.path(), store.clone());
        let storage = MemoryStorage::new("https://proj.supabase.co");

        let summary = run(&ctx, &storage, &shots).await.unwrap();
        assert_eq!(summary.count("PNG files available"), Some(3));
        assert_eq!(summary.count("Players needing shots"), Some(2));
        assert_eq!(summary.count("Uploaded & updated"), Some(2));

        assert!(storage.has_bucket(HEADSHOT_BUCKET).await);
        assert_eq!(storage.object(HEADSHOT_BUCKET, "rookies/p-jeanty.png").await.unwrap(), b"png-a");
        assert_eq!(storage.object_count().await, 2);

        let rows = store.rows("players").await;
        let hunter = rows.iter().find(|r| r["player_id"] == "p-hunter").unwrap();
        assert_eq!(
            hunter["headshot_url"],
            "https://proj.supabase.co/storage/v1/object/public/headshots/rookies/p-hunter.png"
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), std::sync::Arc::new(MemoryStore::new()));
        let storage = MemoryStorage::new("https://proj.supabase.co");
        assert!(run(&ctx, &storage, &dir.path().join("missing")).await.is_err());
    }
}

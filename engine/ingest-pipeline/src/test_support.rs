//! Fixtures shared by pipeline tests

use crate::config::IngestConfig;
use crate::context::IngestContext;
use crate::players::PLAYERS_TABLE;
use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use supabase_rest::{row, MemoryStore, Row};

pub fn player(player_id: &str, first: &str, last: &str, position: &str, team: &str) -> Row {
    let mut player = row([
        ("player_id", json!(player_id)),
        ("first_name", json!(first)),
        ("last_name", json!(last)),
        ("position", json!(position)),
    ]);
    if !team.is_empty() {
        player.insert("latest_team".to_string(), json!(team));
    }
    player
}

/// Add a column to a fixture row
pub fn with(mut row: Row, column: &str, value: serde_json::Value) -> Row {
    row.insert(column.to_string(), value);
    row
}

pub async fn store_with_players(players: Vec<Row>) -> Arc<MemoryStore> {
    let store = MemoryStore::new().with_conflict_keys(PLAYERS_TABLE, &["player_id"]);
    store.insert_rows(PLAYERS_TABLE, players).await;
    Arc::new(store)
}

/// Context rooted at `dir`, dated 2026-02-18
pub fn context(dir: &Path, store: Arc<MemoryStore>) -> IngestContext {
    let mut config = IngestConfig::default();
    config.data.data_dir = dir.to_path_buf();
    let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
    IngestContext::new(config, store).with_today(today)
}

pub fn write_file(path: &Path, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

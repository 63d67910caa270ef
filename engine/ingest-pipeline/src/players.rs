//! Reading and patching the canonical `players` table

use anyhow::{Context, Result};
use player_identity::{PlayerIndex, PlayerRow};
use supabase_rest::{select_as, RestStore, Row, Select};
use tracing::{info, warn};

pub const PLAYERS_TABLE: &str = "players";

/// Columns every index needs
pub const IDENTITY_COLUMNS: [&str; 5] =
    ["player_id", "first_name", "last_name", "position", "latest_team"];

/// Read every player with the identity columns plus `extra`
pub async fn fetch_players(store: &dyn RestStore, extra: &[&str]) -> Result<Vec<PlayerRow>> {
    let mut columns: Vec<&str> = IDENTITY_COLUMNS.to_vec();
    for column in extra {
        if !columns.contains(column) {
            columns.push(column);
        }
    }
    let players: Vec<PlayerRow> = select_as(store, &Select::table(PLAYERS_TABLE).columns(&columns))
        .await
        .context("Failed to fetch players")?;
    info!("Fetched {} players from Supabase", players.len());
    Ok(players)
}

/// Build an index with secondary lookups over `secondary` ID columns
pub async fn load_index(
    store: &dyn RestStore,
    extra: &[&str],
    secondary: &[&str],
) -> Result<PlayerIndex> {
    let mut columns: Vec<&str> = extra.to_vec();
    columns.extend_from_slice(secondary);
    let players = fetch_players(store, &columns).await?;
    Ok(PlayerIndex::build(players).with_secondary_ids(secondary))
}

/// Outcome of a PATCH loop
#[derive(Debug, Default)]
pub struct PatchOutcome {
    pub applied: usize,
    pub failed: Vec<(String, String)>,
}

/// PATCH `players` one row at a time; failures are collected, not fatal
pub async fn patch_players<I>(store: &dyn RestStore, updates: I) -> PatchOutcome
where
    I: IntoIterator<Item = (String, Row)>,
{
    let updates: Vec<(String, Row)> = updates.into_iter().filter(|(_, row)| !row.is_empty()).collect();
    let total = updates.len();
    let mut outcome = PatchOutcome::default();

    for (i, (player_id, row)) in updates.into_iter().enumerate() {
        match store.patch(PLAYERS_TABLE, "player_id", &player_id, &row).await {
            Ok(()) => outcome.applied += 1,
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "PATCH failed");
                outcome.failed.push((player_id, e.to_string()));
            }
        }
        if (i + 1) % 100 == 0 {
            info!("{}/{} players updated", i + 1, total);
        }
    }
    outcome
}

//! `ids apply` / `ids sql`: push merged matched files to `players`

use crate::context::IngestContext;
use crate::layout::write_text;
use crate::matched_files::{merge_all, MatchedSource, ALL_ID_COLUMNS, UPDATE_IDS_SQL};
use crate::players::{fetch_players, patch_players};
use crate::report::{percent, truncated, Summary};
use anyhow::Result;
use player_identity::{MatchedIds, PlayerRow};
use serde_json::Value;
use supabase_rest::Row;
use tracing::info;

/// Quote a string as a SQL literal
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// One `UPDATE players SET ...` per player with at least one ID
pub fn update_statements(merged: &MatchedIds) -> Vec<String> {
    merged
        .iter()
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(player_id, ids)| {
            let sets: Vec<String> =
                ids.iter().map(|(column, value)| format!("{} = {}", column, sql_quote(value))).collect();
            format!("UPDATE players SET {} WHERE player_id = {};", sets.join(", "), sql_quote(player_id))
        })
        .collect()
}

/// `column: count (pct%) ####` lines, most populated first
pub fn coverage_lines(players: &[PlayerRow], columns: &[&str]) -> Vec<String> {
    let total = players.len();
    let mut counts: Vec<(&str, usize)> = columns
        .iter()
        .map(|column| (*column, players.iter().filter(|p| p.has(column)).count()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut lines: Vec<String> = counts
        .into_iter()
        .map(|(column, count)| {
            let pct = percent(count, total);
            let bar = "#".repeat((pct / 2.0) as usize);
            format!("{:20}: {:>5}  ({:4.1}%) {}", column, count, pct, bar)
        })
        .collect();
    lines.push(format!("{:20}: {:>5}", "TOTAL PLAYERS", total));
    lines
}

fn as_rows(merged: &MatchedIds) -> Vec<(String, Row)> {
    merged
        .iter()
        .map(|(player_id, ids)| {
            let row: Row =
                ids.iter().map(|(column, value)| (column.clone(), Value::String(value.clone()))).collect();
            (player_id.clone(), row)
        })
        .collect()
}

fn sources_label(found: &[MatchedSource]) -> String {
    found.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub async fn run_apply(ctx: &IngestContext) -> Result<Summary> {
    info!("Loading matched ID files...");
    let (merged, found) = merge_all(&ctx.layout)?;
    let with_updates = merged.iter().filter(|(_, ids)| !ids.is_empty()).count();
    let total_ids: usize = merged.iter().map(|(_, ids)| ids.len()).sum();
    info!("Merged {} players with {} ID values", with_updates, total_ids);

    let summary = Summary::new("ID APPLY")
        .row("Sources", sources_label(&found))
        .row("Players with updates", with_updates)
        .row("ID values", total_ids);
    if with_updates == 0 {
        return Ok(summary.row("Updated", 0));
    }

    info!("Updating Supabase via REST API...");
    let outcome = patch_players(ctx.store(), as_rows(&merged)).await;
    let failures: Vec<String> =
        outcome.failed.iter().map(|(player_id, e)| format!("{player_id}: {e}")).collect();

    let players = fetch_players(ctx.store(), &ALL_ID_COLUMNS).await?;
    Ok(summary
        .row("Updated", outcome.applied)
        .row("Errors", outcome.failed.len())
        .section("Errors", truncated(failures, 5))
        .section("ID coverage", coverage_lines(&players, &ALL_ID_COLUMNS)))
}

pub async fn run_sql(ctx: &IngestContext) -> Result<Summary> {
    let (merged, found) = merge_all(&ctx.layout)?;
    let statements = update_statements(&merged);
    let sql = statements.join("\n");
    let path = ctx.layout.matched_file(UPDATE_IDS_SQL);
    write_text(&path, &sql)?;

    Ok(Summary::new("ID UPDATE SQL")
        .row("Sources", sources_label(&found))
        .row("UPDATE statements", statements.len())
        .row("SQL bytes", sql.len())
        .row("Saved", path.display()))
}

//! `projections fbg`: Footballguys preseason projections

use crate::context::IngestContext;
use crate::players::load_index;
use crate::report::Summary;
use anyhow::{Context, Result};
use player_identity::{fbg_position, MatchQuery, NameFallback, PlayerIndex, Resolver};
use serde_json::{json, Value};
use source_feeds::footballguys::stat;
use source_feeds::{FbgPlayer, FbgStatLine, FootballguysClient};
use std::collections::{BTreeMap, HashMap};
use supabase_rest::{row, Row, UpsertOptions};
use tracing::{info, warn};

pub const PROJECTIONS_TABLE: &str = "player_projections";
pub const FBG_SOURCE: &str = "fbg";

/// Our column and the FBG stat code it comes from
const STAT_COLUMNS: [(&str, &str); 18] = [
    ("games", "ssn-gms"),
    ("pass_att", "pass-att"),
    ("pass_cmp", "pass-cmp"),
    ("pass_yds", "pass-yds"),
    ("pass_td", "pass-td"),
    ("pass_int", "pass-int"),
    ("pass_sck", "pass-sck"),
    ("pass_first_downs", "pass-1d"),
    ("rush_att", "rush-car"),
    ("rush_yds", "rush-yds"),
    ("rush_td", "rush-td"),
    ("rush_first_downs", "rush-1d"),
    ("targets", "rec-tgt"),
    ("receptions", "rec-rec"),
    ("rec_yds", "rec-yds"),
    ("rec_td", "rec-td"),
    ("rec_first_downs", "rec-1d"),
    ("fumbles_lost", "fum-lost"),
];

/// Half-PPR scoring weights by FBG stat code
const HALF_PPR: [(&str, f64); 9] = [
    ("pass-yds", 0.04),
    ("pass-td", 4.0),
    ("pass-int", -2.0),
    ("rush-yds", 0.1),
    ("rush-td", 6.0),
    ("rec-yds", 0.1),
    ("rec-td", 6.0),
    ("rec-rec", 0.5),
    ("fum-lost", -2.0),
];

/// Half-PPR points, rounded to one decimal
pub fn half_ppr_points(line: &FbgStatLine) -> f64 {
    let points: f64 = HALF_PPR.iter().map(|(key, weight)| stat(line, key).unwrap_or(0.0) * weight).sum();
    (points * 10.0).round() / 10.0
}

/// A `player_projections` row; absent stats are left out
pub fn projection_row(player_id: &str, year: i32, line: &FbgStatLine) -> Row {
    let mut projection = row([
        ("player_id", json!(player_id)),
        ("source", json!(FBG_SOURCE)),
        ("year", json!(year)),
        ("season_type", json!("regular")),
    ]);
    for (column, key) in STAT_COLUMNS {
        if let Some(value) = line.get(key).filter(|v| !v.is_null()) {
            projection.insert(column.to_string(), value.clone());
        }
    }
    projection.insert("half_ppr_pts".to_string(), json!(half_ppr_points(line)));
    projection
}

#[derive(Debug, Default)]
pub struct ProjectionRows {
    pub rows: Vec<Row>,
    /// `(fbg_id, name)`; name is `unknown` when FBG has no player record
    pub not_found: Vec<(String, String)>,
}

pub fn build_projection_rows(
    index: &PlayerIndex,
    projections: &BTreeMap<String, FbgStatLine>,
    fbg_players: &HashMap<&str, &FbgPlayer>,
    year: i32,
) -> ProjectionRows {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut out = ProjectionRows::default();

    for (fbg_id, line) in projections {
        let fbg = fbg_players.get(fbg_id.as_str());
        let name = fbg.map(|p| p.full_name()).unwrap_or_default();
        let mut query = MatchQuery::by_name(&name).secondary("footballguys_id", Some(fbg_id.as_str()));
        if let Some(position) = fbg.and_then(|p| p.pos.as_deref()).and_then(fbg_position) {
            query = query.position(position);
        }

        match resolver.resolve(&query) {
            Some(hit) => out.rows.push(projection_row(&hit.player.player_id, year, line)),
            None => {
                let name = if name.is_empty() { "unknown".to_string() } else { name };
                out.not_found.push((fbg_id.clone(), name));
            }
        }
    }
    out
}

pub async fn run(ctx: &IngestContext, client: &FootballguysClient) -> Result<Summary> {
    let projections = client.projections(ctx.year()).await.context("Failed to fetch FBG projections")?;
    let fbg_players = client.players().await.context("Failed to fetch FBG players")?;
    run_with(ctx, &projections, &fbg_players).await
}

pub async fn run_with(
    ctx: &IngestContext,
    projections: &BTreeMap<String, FbgStatLine>,
    fbg_players: &[FbgPlayer],
) -> Result<Summary> {
    let by_id: HashMap<&str, &FbgPlayer> = fbg_players.iter().filter_map(|p| p.id.as_deref().map(|id| (id, p))).collect();
    let index = load_index(ctx.store(), &[], &["footballguys_id"]).await?;
    let built = build_projection_rows(&index, projections, &by_id, ctx.year());
    info!("Matched {}, not found {}", built.rows.len(), built.not_found.len());

    let mut summary = Summary::new("FBG PROJECTIONS")
        .row("FBG projections", projections.len())
        .row("Matched & loaded", built.rows.len())
        .row("Not found in DB", built.not_found.len());

    if !built.rows.is_empty() {
        info!("Upserting {} projections...", built.rows.len());
        let result = ctx
            .store()
            .upsert(PROJECTIONS_TABLE, built.rows, UpsertOptions::batch(50))
            .await
            .context("Failed to upsert projections")?;
        for error in &result.errors {
            warn!(offset = error.offset, "Batch failed: {}", error.message);
        }
        summary.push_row("Upserted", result.written);
        summary.push_row("Errors", result.failed);
    }

    let unmatched = built.not_found.iter().map(|(id, name)| format!("{:<15} {}", id, name)).collect();
    Ok(summary.section("Unmatched", unmatched))
}

//! `enrich sportsdata` / `enrich fbg`: fill empty bio and ID columns
//!
//! Only blank columns are written, except SportsData status and team which
//! always take the vendor's current value.

use crate::context::IngestContext;
use crate::players::{load_index, patch_players};
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use player_identity::{
    convert_height, fbg_position, is_skill_position, normalize_team, MatchQuery, NameFallback,
    PlayerIndex, PlayerRow, Resolver,
};
use serde_json::{json, Value};
use source_feeds::{FbgPlayer, FootballguysClient, SportsDataClient, SportsDataPlayer};
use std::collections::BTreeMap;
use supabase_rest::Row;
use tracing::info;

const SPORTSDATA_COLUMNS: [&str; 12] = [
    "height",
    "weight",
    "headshot_url",
    "college",
    "birth_date",
    "draft_year",
    "draft_round",
    "draft_pick",
    "sportsdata_id",
    "fanduel_id",
    "draftkings_id",
    "status",
];

const FBG_COLUMNS: [&str; 5] = ["footballguys_id", "fantasy_data_id", "mfl_id", "height", "weight"];

/// Planned updates for one enrichment run
#[derive(Debug, Default)]
pub struct EnrichPlan {
    pub candidates: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub updates: Vec<(String, Row)>,
    /// Column -> number of players getting a value
    pub fills: BTreeMap<String, usize>,
}

impl EnrichPlan {
    fn push(&mut self, player_id: &str, row: Row) {
        if row.is_empty() {
            return;
        }
        for column in row.keys() {
            *self.fills.entry(column.clone()).or_default() += 1;
        }
        self.updates.push((player_id.to_string(), row));
    }

    /// `column: +count`, largest first
    pub fn fill_lines(&self) -> Vec<String> {
        let mut fills: Vec<(&String, &usize)> = self.fills.iter().collect();
        fills.sort_by(|a, b| b.1.cmp(a.1));
        fills.into_iter().map(|(column, count)| format!("{column}: +{count}")).collect()
    }
}

/// Set `column` only when the player has no value for it
fn fill_gap(row: &mut Row, player: &PlayerRow, column: &str, value: Option<Value>) {
    if player.has(column) {
        return;
    }
    if let Some(value) = value {
        row.insert(column.to_string(), value);
    }
}

fn text(value: Option<&str>) -> Option<Value> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(|v| json!(v))
}

/// SportsData updates for one matched player
pub fn sportsdata_updates(player: &PlayerRow, sd: &SportsDataPlayer) -> Row {
    let mut row = Row::new();
    let height = sd.height.as_deref().and_then(convert_height);
    fill_gap(&mut row, player, "height", height.map(Value::from));
    fill_gap(&mut row, player, "weight", sd.weight.filter(|w| *w > 0).map(Value::from));
    fill_gap(&mut row, player, "headshot_url", text(sd.headshot_url()));
    fill_gap(&mut row, player, "college", text(sd.college.as_deref()));
    fill_gap(&mut row, player, "birth_date", sd.birth_date_ymd().map(Value::from));
    fill_gap(&mut row, player, "draft_year", sd.college_draft_year.filter(|v| *v > 0).map(Value::from));
    fill_gap(&mut row, player, "draft_round", sd.college_draft_round.filter(|v| *v > 0).map(Value::from));
    fill_gap(&mut row, player, "draft_pick", sd.college_draft_pick.filter(|v| *v > 0).map(Value::from));
    fill_gap(&mut row, player, "sportsdata_id", Some(json!(sd.player_id.to_string())));
    fill_gap(&mut row, player, "fanduel_id", text(sd.fanduel_id.as_deref()));
    fill_gap(&mut row, player, "draftkings_id", text(sd.draftkings_id.as_deref()));

    if let Some(status) = text(sd.status.as_deref()) {
        row.insert("status".to_string(), status);
    }
    let team = normalize_team(sd.team.as_deref().unwrap_or_default());
    if !team.is_empty() {
        row.insert("latest_team".to_string(), json!(team));
    }
    row
}

/// Sportradar ID, then `sportsdata_id`, then name + position, then name
pub fn plan_sportsdata(index: &PlayerIndex, players: &[SportsDataPlayer]) -> EnrichPlan {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut plan = EnrichPlan::default();

    for sd in players.iter().filter(|p| is_skill_position(&p.position_code())) {
        plan.candidates += 1;
        let sd_id = sd.player_id.to_string();
        let name = sd.full_name();
        let position = sd.position_code();
        let query = MatchQuery::by_name(&name)
            .position(&position)
            .primary_id(sd.sportradar_id.as_deref())
            .secondary("sportsdata_id", Some(&sd_id));

        let Some(hit) = resolver.resolve(&query) else {
            plan.unmatched += 1;
            continue;
        };
        plan.matched += 1;
        plan.push(&hit.player.player_id, sportsdata_updates(hit.player, sd));
    }
    plan
}

/// FBG updates for one matched player
pub fn fbg_updates(player: &PlayerRow, fbg: &FbgPlayer) -> Row {
    let mut row = Row::new();
    fill_gap(&mut row, player, "footballguys_id", text(fbg.id.as_deref()));
    fill_gap(&mut row, player, "fantasy_data_id", text(fbg.fd_id.as_deref()));
    fill_gap(&mut row, player, "height", text(fbg.height.as_deref()));
    fill_gap(&mut row, player, "weight", fbg.weight_lbs().map(Value::from));
    row
}

/// footballguys_id, fantasy_data_id, mfl_id, then name + position, then name
pub fn plan_fbg(index: &PlayerIndex, players: &[FbgPlayer]) -> EnrichPlan {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut plan = EnrichPlan::default();

    for fbg in players {
        let Some(position) = fbg.pos.as_deref().and_then(fbg_position) else {
            continue;
        };
        plan.candidates += 1;
        let name = fbg.full_name();
        let query = MatchQuery::by_name(&name)
            .position(position)
            .secondary("footballguys_id", fbg.id.as_deref())
            .secondary("fantasy_data_id", fbg.fd_id.as_deref())
            .secondary("mfl_id", fbg.mfl());

        let Some(hit) = resolver.resolve(&query) else {
            plan.unmatched += 1;
            continue;
        };
        plan.matched += 1;
        plan.push(&hit.player.player_id, fbg_updates(hit.player, fbg));
    }
    plan
}

async fn apply_plan(ctx: &IngestContext, title: &str, source_label: &str, plan: EnrichPlan) -> Result<Summary> {
    info!("Matched: {}, Unmatched: {}", plan.matched, plan.unmatched);
    info!("Applying {} updates...", plan.updates.len());
    let fills = plan.fill_lines();
    let planned = plan.updates.len();
    let outcome = patch_players(ctx.store(), plan.updates).await;
    let errors: Vec<String> = outcome.failed.iter().map(|(pid, e)| format!("{pid}: {e}")).collect();

    Ok(Summary::new(title)
        .row(source_label, plan.candidates)
        .row("Matched to DB", plan.matched)
        .row("Unmatched", plan.unmatched)
        .row("Players with updates", planned)
        .row("Updates applied", outcome.applied)
        .row("Errors", outcome.failed.len())
        .section("Gap fills", fills)
        .section("Errors", truncated(errors, 10)))
}

pub async fn run_sportsdata(ctx: &IngestContext, client: &SportsDataClient) -> Result<Summary> {
    info!("Fetching SportsData.io Players...");
    let players = client.players().await.context("Failed to fetch SportsData players")?;
    run_sportsdata_with(ctx, players).await
}

pub async fn run_sportsdata_with(ctx: &IngestContext, players: Vec<SportsDataPlayer>) -> Result<Summary> {
    let index = load_index(ctx.store(), &SPORTSDATA_COLUMNS, &["sportsdata_id"]).await?;
    let plan = plan_sportsdata(&index, &players);
    apply_plan(ctx, "SPORTSDATA ENRICHMENT", "SportsData fantasy players", plan).await
}

pub async fn run_fbg(ctx: &IngestContext, client: &FootballguysClient) -> Result<Summary> {
    let players = client.players().await.context("Failed to fetch FBG players")?;
    run_fbg_with(ctx, players).await
}

pub async fn run_fbg_with(ctx: &IngestContext, players: Vec<FbgPlayer>) -> Result<Summary> {
    let index = load_index(ctx.store(), &["height", "weight"], &FBG_COLUMNS[..3]).await?;
    let plan = plan_fbg(&index, &players);
    apply_plan(ctx, "FBG ENRICHMENT", "FBG fantasy players", plan).await
}

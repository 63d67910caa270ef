//! Underdog ADP into `adp_sources`, and the dynasty/ADP sheet export

use crate::context::IngestContext;
use crate::players::load_index;
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use player_identity::{MatchQuery, NameFallback, PlayerIndex, Resolver};
use serde::Deserialize;
use serde_json::{json, Value};
use source_feeds::de::{opt_string, value_to_f64};
use source_feeds::imports::UNDERDOG_ADP_CSV;
use source_feeds::underdog::read_rankings;
use source_feeds::{write_csv, UnderdogClient, UnderdogRanking};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use supabase_rest::{row, select_as, Row, Select, UpsertOptions};
use tracing::{info, warn};

pub const ADP_TABLE: &str = "adp_sources";
pub const UNDERDOG_SOURCE: &str = "underdog";
pub const ADP_BATCH_SIZE: usize = 100;

pub const EXPORT_COLUMNS: [&str; 8] =
    ["dan_id", "Player", "Team", "Position", "Rookie", "Value", "SF_Value", "Underdog_ADP"];

/// Rows ready for `adp_sources` plus what was left out
#[derive(Debug, Default)]
pub struct AdpRows {
    pub rows: Vec<Row>,
    pub skipped_no_adp: usize,
    pub not_found: Vec<String>,
}

/// Match rankings to players and build `adp_sources` rows
///
/// Lookups go through `underdog_id` first; when `fallback` allows it the
/// name is tried with the slot position, and `FLEX` rows match on name only.
pub fn build_adp_rows(
    rankings: &[UnderdogRanking],
    index: &PlayerIndex,
    fallback: NameFallback,
    year: i32,
    date: &str,
) -> AdpRows {
    let resolver = Resolver::new(index, fallback);
    let mut out = AdpRows::default();

    for ranking in rankings {
        let Some(adp) = ranking.adp_value() else {
            out.skipped_no_adp += 1;
            continue;
        };

        let name = if matches!(fallback, NameFallback::Disabled) { String::new() } else { ranking.full_name() };
        let mut query = MatchQuery::by_name(&name).secondary("underdog_id", Some(ranking.id.as_str()));
        if let Some(position) = ranking.slot_position() {
            query = query.position(position);
        }

        let Some(hit) = resolver.resolve(&query) else {
            out.not_found.push(format!(
                "{} ({}) [ud_id={}] adp={}",
                ranking.full_name(),
                ranking.slot_name,
                ranking.id,
                ranking.adp
            ));
            continue;
        };

        out.rows.push(row([
            ("player_id", json!(hit.player.player_id)),
            ("source", json!(UNDERDOG_SOURCE)),
            ("year", json!(year)),
            ("date", json!(date)),
            ("adp", json!(adp)),
            ("projected_points", json!(ranking.projected_points_value())),
            ("position_rank", json!(ranking.position_rank_value())),
        ]));
    }
    out
}

fn upsert_options() -> UpsertOptions {
    UpsertOptions::batch(ADP_BATCH_SIZE).on_conflict(&["player_id", "source", "year", "date"])
}

async fn upsert_underdog(
    ctx: &IngestContext,
    title: &str,
    rankings: Vec<UnderdogRanking>,
    fallback: NameFallback,
) -> Result<Summary> {
    let index = load_index(ctx.store(), &[], &["underdog_id"]).await?;
    let built = build_adp_rows(&rankings, &index, fallback, ctx.year(), &ctx.today_iso());
    info!(
        "{} rows with ADP, {} skipped (no ADP), {} not found in DB",
        built.rows.len(),
        built.skipped_no_adp,
        built.not_found.len()
    );

    let matched = built.rows.len();
    let mut summary = Summary::new(title)
        .row("Underdog CSV rows", rankings.len())
        .row("With ADP value", matched + built.not_found.len())
        .row("Matched", matched)
        .row("Not found in DB", built.not_found.len())
        .row("Skipped (no ADP)", built.skipped_no_adp);

    if matched > 0 {
        info!("Upserting {} rows to {}...", matched, ADP_TABLE);
        let result = ctx
            .store()
            .upsert(ADP_TABLE, built.rows, upsert_options())
            .await
            .context("Failed to upsert adp_sources")?;
        for error in &result.errors {
            warn!(offset = error.offset, rows = error.rows, "Batch failed: {}", error.message);
        }
        summary.push_row("Upserted", result.written);
        summary.push_row("Errors", result.failed);
    }
    summary.push_section("Unmatched players (top 20)", truncated(built.not_found, 20));
    Ok(summary)
}

/// `adp fetch-underdog`: download today's rankings
pub async fn run_fetch_underdog(ctx: &IngestContext, client: &UnderdogClient) -> Result<Summary> {
    info!("Fetching Underdog ADP CSV...");
    let rankings = client.rankings().await.context("Failed to download Underdog rankings")?;
    info!("{} rows downloaded", rankings.len());
    upsert_underdog(ctx, "UNDERDOG ADP FETCH", rankings, NameFallback::Any).await
}

/// `adp load-underdog`: the saved export, `underdog_id` matches only
pub async fn run_load_underdog(ctx: &IngestContext) -> Result<Summary> {
    let path = ctx.layout.imports().join(UNDERDOG_ADP_CSV);
    let rankings = read_rankings(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Read {} rows from Underdog CSV", rankings.len());
    upsert_underdog(ctx, "UNDERDOG ADP LOAD", rankings, NameFallback::Disabled).await
}

#[derive(Debug, Default, Deserialize)]
struct PlayerInfo {
    #[serde(default, deserialize_with = "opt_string")]
    dan_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    position: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    latest_team: Option<String>,
    #[serde(default)]
    draft_year: Option<Value>,
}

impl PlayerInfo {
    fn name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    fn is_rookie(&self, rookie_year: i32) -> bool {
        self.draft_year.as_ref().and_then(value_to_f64).unwrap_or(0.0) >= f64::from(rookie_year)
    }
}

#[derive(Debug, Deserialize)]
struct DynastyValue {
    player_id: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    sf_value: Value,
    #[serde(default)]
    players: Option<PlayerInfo>,
}

#[derive(Debug, Deserialize)]
struct AdpValue {
    player_id: String,
    #[serde(default)]
    adp: Value,
    #[serde(default)]
    players: Option<PlayerInfo>,
}

/// One line of the merged sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow {
    pub dan_id: String,
    pub player: String,
    pub team: String,
    pub position: String,
    pub rookie: bool,
    pub value: Option<f64>,
    pub sf_value: Option<f64>,
    pub underdog_adp: Option<f64>,
}

impl ExportRow {
    fn cells(&self) -> Vec<String> {
        let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        vec![
            self.dan_id.clone(),
            self.player.clone(),
            self.team.clone(),
            self.position.clone(),
            if self.rookie { "TRUE" } else { "FALSE" }.to_string(),
            number(self.value),
            number(self.sf_value),
            number(self.underdog_adp),
        ]
    }
}

fn fill(target: &mut String, value: Option<String>) {
    if target.is_empty() {
        *target = value.unwrap_or_default();
    }
}

fn merge_export(dynasty: Vec<DynastyValue>, adp: Vec<AdpValue>, rookie_year: i32) -> Vec<ExportRow> {
    let mut by_pid: HashMap<String, ExportRow> = HashMap::new();
    let mut order = BTreeSet::new();

    for dv in dynasty {
        let info = dv.players.unwrap_or_default();
        let entry = by_pid.entry(dv.player_id.clone()).or_default();
        entry.dan_id = info.dan_id.clone().unwrap_or_default();
        entry.player = info.name();
        entry.team = info.latest_team.clone().unwrap_or_default();
        entry.position = info.position.clone().unwrap_or_default();
        entry.rookie = info.is_rookie(rookie_year);
        entry.value = value_to_f64(&dv.value);
        entry.sf_value = value_to_f64(&dv.sf_value);
        order.insert(dv.player_id);
    }

    for a in adp {
        let info = a.players.unwrap_or_default();
        let is_new = !by_pid.contains_key(&a.player_id);
        let entry = by_pid.entry(a.player_id.clone()).or_default();
        entry.underdog_adp = value_to_f64(&a.adp);
        if is_new {
            entry.rookie = info.is_rookie(rookie_year);
        }
        let name = Some(info.name()).filter(|n| !n.is_empty());
        fill(&mut entry.player, name);
        fill(&mut entry.team, info.latest_team);
        fill(&mut entry.position, info.position);
        order.insert(a.player_id);
    }

    let mut rows: Vec<ExportRow> = order.into_iter().filter_map(|pid| by_pid.remove(&pid)).collect();
    rows.sort_by(|a, b| {
        let value = |r: &ExportRow| r.value.unwrap_or(-1.0);
        let adp = |r: &ExportRow| r.underdog_adp.unwrap_or(9999.0);
        value(b)
            .partial_cmp(&value(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| adp(a).partial_cmp(&adp(b)).unwrap_or(Ordering::Equal))
    });
    rows
}

/// `adp export-dynasty`: dynasty values joined with today's Underdog ADP
pub async fn run_export_dynasty(ctx: &IngestContext) -> Result<Summary> {
    let player_cols = "players(dan_id,first_name,last_name,position,latest_team,draft_year)";
    let dynasty: Vec<DynastyValue> = select_as(
        ctx.store(),
        &Select::table("dynasty_values").columns(&["player_id", "value", "sf_value", player_cols]),
    )
    .await
    .context("Failed to fetch dynasty values")?;
    info!("Dynasty values: {}", dynasty.len());

    let today = ctx.today_iso();
    let adp: Vec<AdpValue> = select_as(
        ctx.store(),
        &Select::table(ADP_TABLE)
            .columns(&["player_id", "adp", player_cols])
            .eq("source", UNDERDOG_SOURCE)
            .eq("date", &today),
    )
    .await
    .context("Failed to fetch Underdog ADP")?;
    info!("Underdog ADP rows ({}): {}", today, adp.len());

    let rows = merge_export(dynasty, adp, ctx.config.data.rookie_draft_year);
    let path = ctx.layout.dynasty_export_file();
    let cells: Vec<Vec<String>> = rows.iter().map(ExportRow::cells).collect();
    write_csv(&path, &EXPORT_COLUMNS, &cells)?;

    let both = rows.iter().filter(|r| r.value.is_some() && r.underdog_adp.is_some()).count();
    let dynasty_only = rows.iter().filter(|r| r.value.is_some() && r.underdog_adp.is_none()).count();
    let adp_only = rows.iter().filter(|r| r.value.is_none() && r.underdog_adp.is_some()).count();
    Ok(Summary::new("DYNASTY + ADP EXPORT")
        .row("Rows written", rows.len())
        .row("Both dynasty value + ADP", both)
        .row("Dynasty value only", dynasty_only)
        .row("ADP only", adp_only)
        .row("Saved", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players, with, write_file};
    use source_feeds::parse_csv;

    const RANKINGS: &str = "id,firstName,lastName,adp,projectedPoints,positionRank,slotName,teamName\n\
        ud-allen,Josh,Allen,12.3,380.5,QB1,QB,Buffalo Bills\n\
        ud-other,Bijan,Robinson,2.1,0.0,RB1,RB,Atlanta Falcons\n\
        ud-flex,Travis,Kelce,40.0,,TE3,FLEX,Kansas City Chiefs\n\
        ud-nobody,No,Body,150.0,,WR90,WR,Free Agent\n\
        ud-blank,Blank,Adp,-,,,WR,\n";

    async fn store() -> std::sync::Arc<supabase_rest::MemoryStore> {
        store_with_players(vec![
            with(player("p-allen", "Josh", "Allen", "QB", "BUF"), "underdog_id", json!("ud-allen")),
            player("p-bijan", "Bijan", "Robinson", "RB", "ATL"),
            player("p-kelce", "Travis", "Kelce", "TE", "KC"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_build_rows_with_name_fallback() {
        let store = store().await;
        let index = load_index(store.as_ref(), &[], &["underdog_id"]).await.unwrap();
        let rankings: Vec<UnderdogRanking> = parse_csv(RANKINGS).unwrap();

        let built = build_adp_rows(&rankings, &index, NameFallback::Any, 2026, "2026-02-18");
        assert_eq!(built.skipped_no_adp, 1);
        assert_eq!(built.not_found, ["No Body (WR) [ud_id=ud-nobody] adp=150.0"]);
        assert_eq!(built.rows.len(), 3);

        let allen = &built.rows[0];
        assert_eq!(allen["player_id"], "p-allen");
        assert_eq!(allen["projected_points"], 380.5);
        assert_eq!(allen["date"], "2026-02-18");
        let bijan = &built.rows[1];
        assert_eq!(bijan["projected_points"], Value::Null);
        assert_eq!(built.rows[2]["player_id"], "p-kelce");
    }

    #[tokio::test]
    async fn test_load_underdog_uses_ids_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("imports").join(UNDERDOG_ADP_CSV), RANKINGS);
        let store = store().await;
        let ctx = context(dir.path(), store.clone());

        let summary = run_load_underdog(&ctx).await.unwrap();
        assert_eq!(summary.count("Matched"), Some(1));
        assert_eq!(summary.count("Not found in DB"), Some(3));
        assert_eq!(summary.count("Upserted"), Some(1));

        let rows = store.rows(ADP_TABLE).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source"], "underdog");
        assert_eq!(rows[0]["year"], 2026);
    }

    #[tokio::test]
    async fn test_export_full_outer_join_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_players(vec![
            with(with(player("p-a", "Ashton", "Jeanty", "RB", "LV"), "draft_year", json!(2025)), "dan_id", json!(7)),
            with(player("p-b", "Josh", "Allen", "QB", "BUF"), "draft_year", json!(2018)),
            player("p-c", "Adp", "Only", "WR", "NYJ"),
            player("p-d", "Value", "Less", "TE", "KC"),
        ])
        .await;
        store
            .insert_rows(
                "dynasty_values",
                vec![
                    row([("player_id", json!("p-a")), ("value", json!(80)), ("sf_value", json!(78))]),
                    row([("player_id", json!("p-b")), ("value", json!(95)), ("sf_value", Value::Null)]),
                ],
            )
            .await;
        let adp = |pid: &str, adp: f64, date: &str| {
            row([
                ("player_id", json!(pid)),
                ("source", json!("underdog")),
                ("date", json!(date)),
                ("adp", json!(adp)),
            ])
        };
        store
            .insert_rows(
                ADP_TABLE,
                vec![
                    adp("p-a", 5.5, "2026-02-18"),
                    adp("p-c", 120.0, "2026-02-18"),
                    adp("p-d", 60.0, "2026-02-18"),
                    adp("p-b", 1.0, "2026-02-17"),
                ],
            )
            .await;
        let ctx = context(dir.path(), store);

        let summary = run_export_dynasty(&ctx).await.unwrap();
        assert_eq!(summary.count("Rows written"), Some(4));
        assert_eq!(summary.count("Both dynasty value + ADP"), Some(1));
        assert_eq!(summary.count("ADP only"), Some(2));

        let text = std::fs::read_to_string(ctx.layout.dynasty_export_file()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dan_id,Player,Team,Position,Rookie,Value,SF_Value,Underdog_ADP");
        assert_eq!(lines[1], ",Josh Allen,BUF,QB,FALSE,95,,");
        assert_eq!(lines[2], "7,Ashton Jeanty,LV,RB,TRUE,80,78,5.5");
        assert_eq!(lines[3], ",Value Less,KC,TE,FALSE,,,60");
        assert_eq!(lines[4], ",Adp Only,NYJ,WR,FALSE,,,120");
    }
}

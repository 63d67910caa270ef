//! `ids add-missing`: INSERTs for high-ADP Underdog players with no DB row
//!
//! IDs are gathered from nflreadr, the SportsData cache and the DraftKings
//! and Drafters exports. Statements use `ON CONFLICT (player_id) DO NOTHING`
//! so a rerun is harmless.

use crate::context::IngestContext;
use crate::layout::{read_json, read_json_if_exists, write_text};
use crate::matched_files::{INSERT_MISSING_SQL, SPORTSDATA_CACHE, UNDERDOG_UNMATCHED};
use crate::pipelines::ids::sql_quote;
use crate::pipelines::match_ids::UNKNOWN_ADP;
use crate::pipelines::or_empty;
use crate::report::Summary;
use anyhow::{Context, Result};
use player_identity::{normalize_team, NameTable};
use serde::Deserialize;
use serde_json::{json, Value};
use source_feeds::imports::{
    parse_whole_number, read_draftkings, read_drafters, DraftKingsRanking, DraftersPlayer,
};
use source_feeds::{NflreadrDir, NflreadrRecord, SportsDataPlayer};
use supabase_rest::{ManagementClient, Row};
use tracing::info;

/// Players deeper than this are not worth a row
pub const MAX_ADP: f64 = 500.0;

/// ID columns `ff_playerids.csv` carries under the same names
const NFLREADR_COLUMNS: [&str; 18] = [
    "gsis_id",
    "espn_id",
    "yahoo_id",
    "sleeper_id",
    "pfr_id",
    "rotowire_id",
    "pff_id",
    "fantasypros_id",
    "mfl_id",
    "stats_id",
    "stats_global_id",
    "fantasy_data_id",
    "cbs_id",
    "fleaflicker_id",
    "swish_id",
    "ktc_id",
    "cfbref_id",
    "rotoworld_id",
];

const INTEGER_COLUMNS: [&str; 3] = ["draft_year", "draft_round", "draft_pick"];

/// Entry of `underdog_unmatched.json`
#[derive(Debug, Clone, Deserialize)]
pub struct UnderdogMissing {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub team: String,
    #[serde(default = "unknown_adp")]
    pub adp: f64,
    #[serde(default)]
    pub underdog_id: String,
}

fn unknown_adp() -> f64 {
    UNKNOWN_ADP
}

/// Side sources searched by name + position, then name
pub struct Lookups {
    pub nflreadr: NameTable<NflreadrRecord>,
    pub sportsdata: NameTable<SportsDataPlayer>,
    pub draftkings: NameTable<DraftKingsRanking>,
    pub drafters: NameTable<DraftersPlayer>,
}

impl Lookups {
    pub fn build(
        nflreadr: Vec<NflreadrRecord>,
        sportsdata: Vec<SportsDataPlayer>,
        draftkings: Vec<DraftKingsRanking>,
        drafters: Vec<DraftersPlayer>,
    ) -> Self {
        Self {
            nflreadr: NameTable::build(nflreadr, |r| (r.get("name").to_string(), r.get("position").to_string())),
            sportsdata: NameTable::build(sportsdata, |p| (p.full_name(), p.position_code())),
            draftkings: NameTable::build(draftkings, |r| (r.name.clone(), r.position.clone())),
            drafters: NameTable::build(drafters, |r| (r.name.clone(), r.position.clone())),
        }
    }
}

fn put(row: &mut Row, column: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        row.insert(column.to_string(), json!(value));
    }
}

fn put_integer(row: &mut Row, column: &str, value: Option<&str>) {
    if let Some(n) = value.and_then(parse_whole_number) {
        row.insert(column.to_string(), json!(n));
    }
}

/// Build the `players` row for one missing player
///
/// Returns `None` when neither nflreadr nor Underdog supplies an ID.
pub fn build_player(missing: &UnderdogMissing, lookups: &Lookups) -> Option<Row> {
    let nr = lookups.nflreadr.find(&missing.name, &missing.pos);
    let sd = lookups.sportsdata.find(&missing.name, &missing.pos);

    let player_id = nr
        .and_then(|r| r.opt("sportradar_id"))
        .or(Some(missing.underdog_id.as_str()).filter(|id| !id.is_empty()))?;

    let (first_name, last_name) = missing.name.split_once(' ').unwrap_or((missing.name.as_str(), ""));
    let mut team = missing.team.clone();
    if team.is_empty() {
        if let Some(nr) = nr {
            team = normalize_team(nr.get("team"));
        }
    }
    if team.is_empty() {
        if let Some(sd) = sd {
            team = normalize_team(sd.team.as_deref().unwrap_or_default());
        }
    }

    let mut row = Row::new();
    row.insert("player_id".to_string(), json!(player_id));
    row.insert("first_name".to_string(), json!(first_name));
    row.insert("last_name".to_string(), json!(last_name));
    row.insert("position".to_string(), json!(missing.pos));
    put(&mut row, "latest_team", Some(&team));
    put(&mut row, "underdog_id", Some(&missing.underdog_id));

    if let Some(nr) = nr {
        for column in &NFLREADR_COLUMNS {
            put(&mut row, column, nr.opt(column));
        }
        put(&mut row, "birth_date", nr.opt("birthdate").filter(|d| !d.starts_with("0000")));
        put(&mut row, "college", nr.opt("college"));
        put_integer(&mut row, "draft_year", nr.opt("draft_year"));
        put_integer(&mut row, "draft_round", nr.opt("draft_round"));
        put_integer(&mut row, "draft_pick", nr.opt("draft_ovr"));
    }

    if let Some(sd) = sd {
        row.insert("sportsdata_id".to_string(), json!(sd.player_id.to_string()));
        put(&mut row, "fanduel_id", sd.fanduel_id.as_deref());
        put(&mut row, "draftkings_id", sd.draftkings_id.as_deref());
    }

    if !row.contains_key("draftkings_id") {
        let dk = lookups.draftkings.find(&missing.name, &missing.pos);
        put(&mut row, "draftkings_id", dk.map(|r| r.id.as_str()));
    }
    let drafters = lookups.drafters.find(&missing.name, &missing.pos);
    put(&mut row, "drafters_id", drafters.map(|r| r.clean_id()));

    Some(row)
}

/// `INSERT INTO players (...) VALUES (...) ON CONFLICT (player_id) DO NOTHING;`
///
/// Columns come out in sorted order; draft fields are bare integers.
pub fn insert_statement(row: &Row) -> String {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (column, value) in row {
        let literal = match value {
            Value::Null => continue,
            Value::Number(n) if INTEGER_COLUMNS.contains(&column.as_str()) => n.to_string(),
            Value::String(s) => sql_quote(s),
            other => sql_quote(&other.to_string()),
        };
        columns.push(column.as_str());
        values.push(literal);
    }
    format!(
        "INSERT INTO players ({}) VALUES ({}) ON CONFLICT (player_id) DO NOTHING;",
        columns.join(", "),
        values.join(", ")
    )
}

/// Unmatched entries at or under `MAX_ADP`, best first
pub fn top_missing(mut entries: Vec<UnderdogMissing>) -> Vec<UnderdogMissing> {
    entries.retain(|u| u.adp <= MAX_ADP);
    entries.sort_by(|a, b| a.adp.total_cmp(&b.adp));
    entries
}

fn load_lookups(ctx: &IngestContext) -> Result<Lookups> {
    let nflreadr = or_empty(NflreadrDir::new(ctx.layout.nflreadr()).ff_playerids(), "ff_playerids.csv")?;
    let sportsdata: Vec<SportsDataPlayer> =
        read_json_if_exists(&ctx.layout.matched_file(SPORTSDATA_CACHE))?.unwrap_or_default();
    let imports = ctx.layout.imports();
    let draftkings = or_empty(read_draftkings(&imports), "DraftKings export")?;
    let drafters = or_empty(read_drafters(&imports), "Drafters export")?;
    info!(
        nflreadr = nflreadr.len(),
        sportsdata = sportsdata.len(),
        draftkings = draftkings.len(),
        drafters = drafters.len(),
        "Loaded lookup sources"
    );
    Ok(Lookups::build(nflreadr, sportsdata, draftkings, drafters))
}

/// Write the INSERT script; with `apply` also run it through the Management API
pub async fn run(ctx: &IngestContext, apply: bool) -> Result<Summary> {
    let unmatched_path = ctx.layout.matched_file(UNDERDOG_UNMATCHED);
    let unmatched: Vec<UnderdogMissing> = read_json(&unmatched_path)
        .with_context(|| format!("Run `match underdog` first to create {}", unmatched_path.display()))?;
    let top = top_missing(unmatched);
    info!("Unmatched Underdog players with ADP <= {}: {}", MAX_ADP, top.len());

    let lookups = load_lookups(ctx)?;
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for missing in &top {
        match build_player(missing, &lookups) {
            Some(row) => rows.push(row),
            None => skipped.push(format!("No player_id for {}", missing.name)),
        }
    }

    let statements: Vec<String> = rows.iter().map(insert_statement).collect();
    let path = ctx.layout.matched_file(INSERT_MISSING_SQL);
    write_text(&path, &statements.join("\n"))?;

    let preview = rows
        .iter()
        .take(20)
        .map(|row| {
            let text = |c: &str| row.get(c).and_then(Value::as_str).unwrap_or_default().to_string();
            let ids = row.keys().filter(|k| k.ends_with("_id")).count();
            format!(
                "{:30} {:3} {:4} - {} IDs",
                format!("{} {}", text("first_name"), text("last_name")),
                text("position"),
                text("latest_team"),
                ids
            )
        })
        .collect();

    let mut summary = Summary::new("ADD MISSING PLAYERS")
        .row("Candidates", top.len())
        .row("Prepared", rows.len())
        .row("Saved", path.display())
        .section("Skipped", skipped)
        .section("First 20 players to be added", preview);

    if apply && !statements.is_empty() {
        let (project_ref, token) = ctx.config.management()?;
        let client = ManagementClient::new(project_ref, token)?;
        let (ok, failures) = client.execute_all(&statements).await;
        let failed: Vec<String> =
            failures.iter().map(|(i, e)| format!("statement {}: {}", i + 1, e)).collect();
        summary.push_row("Inserted", ok);
        summary.push_row("Failed", failed.len());
        summary.push_section("Failed statements", failed);
    }
    Ok(summary)
}

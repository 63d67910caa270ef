//! `nffc load`: insert the clean CSVs, parents before children

use super::{ADP_CSV, DRAFT_PICKS_CSV, LEAGUES_CSV, LEAGUE_TEAMS_CSV, PLAYERS_CSV};
use crate::context::IngestContext;
use crate::report::Summary;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use source_feeds::imports::{parse_number, parse_whole_number};
use source_feeds::read_csv;
use std::collections::HashMap;
use supabase_rest::{Row, UpsertOptions};
use tracing::{info, warn};

pub const LOAD_BATCH_SIZE: usize = 500;

type CsvRow = HashMap<String, String>;

fn text<'a>(row: &'a CsvRow, column: &str) -> Option<&'a str> {
    row.get(column).map(|v| v.trim()).filter(|v| !v.is_empty() && !matches!(*v, "NA" | "nan"))
}

fn nullable(row: &CsvRow, column: &str) -> Value {
    text(row, column).map(|v| json!(v)).unwrap_or(Value::Null)
}

/// Zeroed dates from the API are not valid Postgres dates
fn nullable_date(row: &CsvRow, column: &str) -> Value {
    text(row, column).filter(|v| !v.starts_with("0000")).map(|v| json!(v)).unwrap_or(Value::Null)
}

fn int(row: &CsvRow, column: &str) -> Option<i64> {
    text(row, column).and_then(parse_whole_number)
}

fn nullable_int(row: &CsvRow, column: &str) -> Value {
    int(row, column).map(|n| json!(n)).unwrap_or(Value::Null)
}

fn nullable_float(row: &CsvRow, column: &str) -> Value {
    text(row, column).and_then(parse_number).map(|n| json!(n)).unwrap_or(Value::Null)
}

fn player(row: &CsvRow) -> Option<Row> {
    let player_id = text(row, "player_id")?;
    let mut out = Row::new();
    out.insert("player_id".into(), json!(player_id));
    for column in [
        "first_name",
        "last_name",
        "position",
        "gsis_id",
        "espn_id",
        "yahoo_id",
        "sleeper_id",
        "pfr_id",
        "rotowire_id",
        "headshot_url",
        "college",
        "latest_team",
        "status",
    ] {
        out.insert(column.into(), nullable(row, column));
    }
    out.insert("birth_date".into(), nullable_date(row, "birth_date"));
    for column in ["draft_year", "draft_round", "draft_pick"] {
        out.insert(column.into(), nullable_int(row, column));
    }
    Some(out)
}

fn league(row: &CsvRow) -> Option<Row> {
    let reversal = text(row, "third_round_reversal").is_some_and(|v| v.eq_ignore_ascii_case("true"));
    Some(supabase_rest::row([
        ("league_id", json!(int(row, "league_id")?)),
        ("year", json!(int(row, "year")?)),
        ("name", nullable(row, "name")),
        ("num_teams", nullable_int(row, "roster_size")),
        ("third_round_reversal", json!(reversal)),
        ("draft_date", nullable_date(row, "draft_date")),
        ("draft_completed_date", nullable_date(row, "draft_completed_date")),
    ]))
}

fn league_team(row: &CsvRow) -> Option<Row> {
    Some(supabase_rest::row([
        ("league_id", json!(int(row, "league_id")?)),
        ("team_id", json!(int(row, "team_id")?)),
        ("year", json!(int(row, "year")?)),
        ("draft_order", nullable_int(row, "draft_order")),
        ("league_rank", nullable_int(row, "league_rank")),
        ("league_points", nullable_float(row, "league_points")),
        ("overall_rank", nullable_int(row, "overall_rank")),
        ("overall_points", nullable_float(row, "overall_points")),
    ]))
}

fn adp(row: &CsvRow) -> Option<Row> {
    Some(supabase_rest::row([
        ("player_id", json!(text(row, "player_id")?)),
        ("year", json!(int(row, "year")?)),
        ("adp", nullable_float(row, "adp")),
        ("min_pick", nullable_int(row, "min_pick")),
        ("max_pick", nullable_int(row, "max_pick")),
        ("times_drafted", nullable_int(row, "times_drafted")),
    ]))
}

fn draft_pick(row: &CsvRow) -> Option<Row> {
    Some(supabase_rest::row([
        ("league_id", json!(int(row, "league_id")?)),
        ("year", json!(int(row, "year")?)),
        ("round", json!(int(row, "round")?)),
        ("pick_in_round", json!(int(row, "pick_in_round")?)),
        ("overall_pick", json!(int(row, "overall_pick")?)),
        ("team_id", json!(int(row, "team_id")?)),
        ("player_id", json!(text(row, "player_id")?)),
        ("picked_at", nullable(row, "timestamp")),
        ("pick_duration", nullable_int(row, "pick_duration")),
    ]))
}

/// One clean CSV and the table it feeds
pub struct TableLoad {
    pub table: &'static str,
    pub file: &'static str,
    transform: fn(&CsvRow) -> Option<Row>,
}

/// Foreign keys point from later entries to earlier ones
pub const LOAD_ORDER: [TableLoad; 5] = [
    TableLoad { table: "players", file: PLAYERS_CSV, transform: player },
    TableLoad { table: "leagues", file: LEAGUES_CSV, transform: league },
    TableLoad { table: "league_teams", file: LEAGUE_TEAMS_CSV, transform: league_team },
    TableLoad { table: "adp", file: ADP_CSV, transform: adp },
    TableLoad { table: "draft_picks", file: DRAFT_PICKS_CSV, transform: draft_pick },
];

impl TableLoad {
    /// Rows ready to insert and the number of rows missing required keys
    pub fn rows(&self, records: &[CsvRow]) -> (Vec<Row>, usize) {
        let rows: Vec<Row> = records.iter().filter_map(self.transform).collect();
        let skipped = records.len() - rows.len();
        (rows, skipped)
    }
}

pub async fn run(ctx: &IngestContext) -> Result<Summary> {
    let mut summary = Summary::new("NFFC LOAD");
    let mut missing = Vec::new();
    let mut skipped_total = 0;

    for load in &LOAD_ORDER {
        let path = ctx.layout.clean().join(load.file);
        if !path.exists() {
            warn!("{} not found, skipping {}", path.display(), load.table);
            missing.push(load.file.to_string());
            continue;
        }
        let records: Vec<CsvRow> = read_csv(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let (rows, skipped) = load.rows(&records);
        skipped_total += skipped;
        if skipped > 0 {
            warn!(table = load.table, skipped, "Rows missing required keys");
        }

        let options = UpsertOptions { merge_duplicates: false, ..UpsertOptions::batch(LOAD_BATCH_SIZE) };
        let result = ctx
            .store()
            .upsert(load.table, rows, options)
            .await
            .with_context(|| format!("Failed to load {}", load.table))?;
        if let Some(error) = result.errors.first() {
            anyhow::bail!(
                "{} batch at row {} failed ({}): {}",
                load.table,
                error.offset,
                error.status.map(|s| s.to_string()).unwrap_or_else(|| "no status".into()),
                error.message
            );
        }
        info!("{}: {} rows loaded", load.table, result.written);
        summary.push_row(load.table, result.written);
    }

    summary.push_row("Rows skipped", skipped_total);
    Ok(summary.section("Missing files", missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, write_file};
    use std::sync::Arc;
    use supabase_rest::MemoryStore;

    fn csv_row(pairs: &[(&str, &str)]) -> CsvRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_null_conversions() {
        let row = csv_row(&[
            ("player_id", "sr-1"),
            ("first_name", "NA"),
            ("last_name", "nan"),
            ("birth_date", "0000-00-00"),
            ("draft_year", "2018.0"),
            ("draft_pick", ""),
        ]);
        let loaded = player(&row).unwrap();
        assert!(loaded["first_name"].is_null());
        assert!(loaded["last_name"].is_null());
        assert!(loaded["birth_date"].is_null());
        assert_eq!(loaded["draft_year"], 2018);
        assert!(loaded["draft_pick"].is_null());
        assert!(loaded["status"].is_null());

        assert!(player(&csv_row(&[("player_id", "")])).is_none());
    }

    #[test]
    fn test_league_and_pick_rows() {
        let league = league(&csv_row(&[
            ("league_id", "11"),
            ("year", "2024"),
            ("name", "RotoWire Online #1"),
            ("roster_size", "20"),
            ("third_round_reversal", "True"),
            ("draft_date", "2024-08-20"),
            ("draft_completed_date", ""),
        ]))
        .unwrap();
        assert_eq!(league["num_teams"], 20);
        assert_eq!(league["third_round_reversal"], true);
        assert!(!league.contains_key("roster_size"));

        let pick = draft_pick(&csv_row(&[
            ("league_id", "11"),
            ("year", "2024"),
            ("round", "2"),
            ("pick_in_round", "2"),
            ("overall_pick", "14"),
            ("team_id", "101"),
            ("player_id", "sr-1"),
            ("timestamp", "2024-08-20 20:03:11"),
            ("pick_duration", ""),
        ]))
        .unwrap();
        assert_eq!(pick["picked_at"], "2024-08-20 20:03:11");
        assert!(pick["pick_duration"].is_null());

        assert!(draft_pick(&csv_row(&[("league_id", "11")])).is_none());
    }

    #[tokio::test]
    async fn test_run_loads_in_order_and_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), store.clone());
        write_file(
            &ctx.layout.clean().join(PLAYERS_CSV),
            "player_id,first_name,last_name,position,birth_date\nsr-1,Josh,Allen,QB,1996-05-21\n,Blank,Row,QB,\n",
        );
        write_file(
            &ctx.layout.clean().join(ADP_CSV),
            "player_id,year,adp,min_pick,max_pick,times_drafted\nsr-1,2024,14.2,9,20,300\n",
        );

        let summary = run(&ctx).await.unwrap();
        assert_eq!(summary.count("players"), Some(1));
        assert_eq!(summary.count("adp"), Some(1));
        assert_eq!(summary.count("Rows skipped"), Some(1));
        assert_eq!(summary.section_lines("Missing files").map(<[String]>::len), Some(3));

        let calls: Vec<String> = store.upsert_calls().await.into_iter().map(|(table, _)| table).collect();
        assert_eq!(calls, vec!["players", "adp"]);
        assert_eq!(store.rows("adp").await[0]["adp"], 14.2);
    }

    #[tokio::test]
    async fn test_failed_batch_stops_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new().with_failing_table("players"));
        let ctx = context(dir.path(), store.clone());
        write_file(&ctx.layout.clean().join(PLAYERS_CSV), "player_id\nsr-1\n");
        write_file(&ctx.layout.clean().join(LEAGUES_CSV), "league_id,year\n11,2024\n");

        assert!(run(&ctx).await.is_err());
        assert!(store.rows("leagues").await.is_empty());
    }
}

//! nflreadr stat exports into typed tables
//!
//! Cells are sent as text unless the table declares them integer or float.
//! Generated columns are computed by Postgres and never sent.

use crate::context::IngestContext;
use crate::players::PLAYERS_TABLE;
use crate::report::Summary;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use source_feeds::imports::{parse_number, parse_whole_number};
use source_feeds::nflreadr::PLAYER_STATS_CSV;
use source_feeds::{NflreadrDir, NflreadrRecord};
use std::collections::HashSet;
use supabase_rest::{Row, Select, UpsertOptions};
use tracing::{info, warn};

pub const STATS_BATCH_SIZE: usize = 500;

/// Column typing for one stats table
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub table: &'static str,
    pub generated: &'static [&'static str],
    pub integers: &'static [&'static str],
    pub floats: &'static [&'static str],
}

#[rustfmt::skip]
pub const PLAYER_STATS: TableSpec = TableSpec {
    table: "player_stats",
    generated: &["fantasy_points_hppr", "fantasy_points_ppr"],
    integers: &[
        "season", "week",
        "pass_att", "pass_cmp", "pass_yds", "pass_td", "pass_int",
        "sacks", "sack_yds", "sack_fumbles_lost",
        "pass_air_yds", "pass_yac", "pass_first_downs", "pass_2pt",
        "rush_att", "rush_yds", "rush_td", "rush_fumbles_lost",
        "rush_first_downs", "rush_2pt",
        "targets", "receptions", "rec_yds", "rec_td", "rec_fumbles_lost",
        "rec_air_yds", "rec_yac", "rec_first_downs", "rec_2pt",
        "special_teams_tds",
    ],
    floats: &["fantasy_points"],
};

impl TableSpec {
    /// Typed row for one CSV record; blanks and `NA` become null
    pub fn transform(&self, record: &NflreadrRecord) -> Row {
        let mut out = Row::new();
        for (column, cell) in record.fields() {
            if self.generated.contains(&column.as_str()) {
                continue;
            }
            let value = if cell.is_empty() {
                Value::Null
            } else if self.integers.contains(&column.as_str()) {
                parse_whole_number(cell).map(|n| json!(n)).unwrap_or(Value::Null)
            } else if self.floats.contains(&column.as_str()) {
                parse_number(cell).map(|n| json!(n)).unwrap_or(Value::Null)
            } else {
                json!(cell)
            };
            out.insert(column.clone(), value);
        }
        out
    }

    /// Transform, upsert in batches and verify with an exact count
    pub async fn load(&self, ctx: &IngestContext, records: &[NflreadrRecord], title: &str) -> Result<Summary> {
        let rows: Vec<Row> = records.iter().map(|r| self.transform(r)).collect();
        info!(
            "Transformed {} rows (excluded {} generated columns)",
            rows.len(),
            self.generated.len()
        );

        let total = rows.len();
        let result = ctx
            .store()
            .upsert(self.table, rows, UpsertOptions::batch(STATS_BATCH_SIZE))
            .await
            .with_context(|| format!("Failed to upsert {}", self.table))?;
        for error in &result.errors {
            warn!(offset = error.offset, rows = error.rows, "Batch failed: {}", error.message);
        }

        let count = ctx.store().count(self.table).await.with_context(|| format!("Failed to count {}", self.table))?;
        info!("Verified: {} rows in {}", count, self.table);

        Ok(Summary::new(title)
            .row("Rows", total)
            .row("Inserted/updated", result.written)
            .row("Errors", result.failed)
            .row(&format!("Rows in {}", self.table), count))
    }
}

/// `stats players`: weekly player stats for players we know
pub async fn run_players(ctx: &IngestContext) -> Result<Summary> {
    let dir = NflreadrDir::new(ctx.layout.nflreadr());
    let records = dir
        .player_stats()
        .with_context(|| format!("Failed to read {}; run the R export first", PLAYER_STATS_CSV))?;
    info!("Read {} rows from {}", records.len(), PLAYER_STATS_CSV);

    let known: HashSet<String> = ctx
        .store()
        .select_all(&Select::table(PLAYERS_TABLE).columns(&["player_id"]))
        .await
        .context("Failed to fetch player IDs")?
        .into_iter()
        .filter_map(|row| row.get("player_id").and_then(Value::as_str).map(str::to_string))
        .collect();
    info!("{} players in DB", known.len());

    let csv_rows = records.len();
    let records: Vec<NflreadrRecord> =
        records.into_iter().filter(|r| known.contains(r.get("player_id"))).collect();
    info!("{} rows after filtering to DB players", records.len());

    let summary = PLAYER_STATS.load(ctx, &records, "PLAYER STATS LOAD").await?;
    Ok(summary.row("Dropped (unknown player)", csv_rows - records.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players, write_file};
    use std::collections::HashMap;

    fn record(pairs: &[(&str, &str)]) -> NflreadrRecord {
        NflreadrRecord::from_fields(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>())
    }

    #[test]
    fn test_transform_types_and_drops_generated() {
        let row = PLAYER_STATS.transform(&record(&[
            ("player_id", "p1"),
            ("season", "2024"),
            ("pass_yds", "4306.0"),
            ("rush_td", "NA"),
            ("fantasy_points", "379.42"),
            ("fantasy_points_ppr", "379.42"),
            ("team", "BUF"),
        ]));
        assert_eq!(row["season"], 2024);
        assert_eq!(row["pass_yds"], 4306);
        assert_eq!(row["rush_td"], Value::Null);
        assert_eq!(row["fantasy_points"], 379.42);
        assert_eq!(row["team"], "BUF");
        assert!(!row.contains_key("fantasy_points_ppr"));
    }

    #[tokio::test]
    async fn test_player_stats_filtered_to_known_players() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("nflreadr").join(PLAYER_STATS_CSV),
            "player_id,season,week,pass_yds,fantasy_points,fantasy_points_hppr\n\
             p1,2024,1,262,20.5,21.0\n\
             p1,2024,2,NA,3.1,3.1\n\
             ghost,2024,1,10,1.0,1.0\n",
        );
        let store = store_with_players(vec![player("p1", "Josh", "Allen", "QB", "BUF")]).await;
        let ctx = context(dir.path(), store.clone());

        let summary = run_players(&ctx).await.unwrap();
        assert_eq!(summary.count("Rows"), Some(2));
        assert_eq!(summary.count("Dropped (unknown player)"), Some(1));
        assert_eq!(summary.count("Rows in player_stats"), Some(2));

        let rows = store.rows("player_stats").await;
        assert!(rows.iter().all(|r| !r.contains_key("fantasy_points_hppr")));
        assert_eq!(rows[0]["week"], 1);
    }
}

//! `teams load` and `teams game-stats`

use super::stats::TableSpec;
use crate::context::IngestContext;
use crate::report::Summary;
use anyhow::{Context, Result};
use serde::Deserialize;
use source_feeds::nflreadr::{TEAMS_CSV, TEAM_GAME_STATS_CSV};
use source_feeds::NflreadrDir;
use supabase_rest::{select_as, Row, Select, UpsertOptions};
use tracing::info;

pub const TEAMS_TABLE: &str = "teams";

/// Every column is text
const TEAMS: TableSpec = TableSpec { table: TEAMS_TABLE, generated: &[], integers: &[], floats: &[] };

#[rustfmt::skip]
pub const TEAM_GAME_STATS: TableSpec = TableSpec {
    table: "team_game_stats",
    generated: &[
        "off_recv_fp_hppr", "off_recv_fp_ppr",
        "off_total_fp_hppr", "off_total_fp_ppr",
        "qb_fp_hppr", "qb_fp_ppr",
        "rb_fp_hppr", "rb_fp_ppr",
        "wr_fp_hppr", "wr_fp_ppr",
        "te_fp_hppr", "te_fp_ppr",
        "def_recv_fp_hppr", "def_recv_fp_ppr",
        "def_total_fp_hppr", "def_total_fp_ppr",
        "def_qb_fp_hppr", "def_qb_fp_ppr",
        "def_rb_fp_hppr", "def_rb_fp_ppr",
        "def_wr_fp_hppr", "def_wr_fp_ppr",
        "def_te_fp_hppr", "def_te_fp_ppr",
    ],
    integers: &[
        "season", "week", "team_score", "opp_score",
        "pass_att", "pass_cmp", "pass_yds", "pass_td", "pass_int",
        "rush_att", "rush_yds", "rush_td",
        "targets", "receptions", "rec_yds", "rec_td",
        "qb_rec", "rb_rec", "wr_rec", "te_rec",
        "def_receptions",
        "def_qb_rec", "def_rb_rec", "def_wr_rec", "def_te_rec",
    ],
    floats: &[
        "spread", "total_line", "implied_total",
        "off_pass_fp", "off_rush_fp", "off_recv_fp", "off_total_fp",
        "qb_fp", "rb_fp", "wr_fp", "te_fp",
        "def_pass_fp", "def_rush_fp", "def_recv_fp", "def_total_fp",
        "def_qb_fp", "def_rb_fp", "def_wr_fp", "def_te_fp",
    ],
};

#[derive(Debug, Deserialize)]
struct TeamListing {
    team_abbr: String,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    team_conf: Option<String>,
}

/// Upsert all teams in one request, then list what the table holds
pub async fn run_load(ctx: &IngestContext) -> Result<Summary> {
    let dir = NflreadrDir::new(ctx.layout.nflreadr());
    let records = dir.teams().with_context(|| format!("Failed to read {}; run the R export first", TEAMS_CSV))?;
    info!("Read {} teams from {}", records.len(), TEAMS_CSV);

    let rows: Vec<Row> = records.iter().map(|r| TEAMS.transform(r)).collect();
    let total = rows.len();
    let result = ctx
        .store()
        .upsert(TEAMS_TABLE, rows, UpsertOptions::batch(total.max(1)).on_conflict(&["team_abbr"]))
        .await
        .context("Failed to upsert teams")?;
    if !result.is_clean() {
        let message = result.errors.first().map(|e| e.message.clone()).unwrap_or_default();
        anyhow::bail!("Teams upsert failed: {}", message);
    }
    info!("Upserted {} teams", result.written);

    let query = Select::table(TEAMS_TABLE).columns(&["team_abbr", "team_name", "team_conf"]).order("team_abbr");
    let teams: Vec<TeamListing> = select_as(ctx.store(), &query).await.context("Failed to read teams back")?;
    let listing = teams
        .iter()
        .map(|t| {
            format!(
                "{:<4} {:<30} {}",
                t.team_abbr,
                t.team_name.as_deref().unwrap_or_default(),
                t.team_conf.as_deref().unwrap_or_default()
            )
        })
        .collect();

    Ok(Summary::new("TEAMS LOAD")
        .row("Teams in CSV", total)
        .row("Upserted", result.written)
        .section(&format!("Verified {} teams in DB", teams.len()), listing))
}

/// Weekly team offense/defense splits
pub async fn run_game_stats(ctx: &IngestContext) -> Result<Summary> {
    let dir = NflreadrDir::new(ctx.layout.nflreadr());
    let records = dir
        .team_game_stats()
        .with_context(|| format!("Failed to read {}; run the R export first", TEAM_GAME_STATS_CSV))?;
    info!("Read {} rows from {}", records.len(), TEAM_GAME_STATS_CSV);
    TEAM_GAME_STATS.load(ctx, &records, "TEAM GAME STATS LOAD").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;
    use std::sync::Arc;
    use supabase_rest::MemoryStore;

    #[tokio::test]
    async fn test_teams_load_lists_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("nflreadr").join(TEAMS_CSV),
            "team_abbr,team_name,team_conf,team_division\n\
             KC,Kansas City Chiefs,AFC,AFC West\n\
             BUF,Buffalo Bills,AFC,AFC East\n\
             ARI,Arizona Cardinals,NFC,NA\n",
        );
        let store = Arc::new(MemoryStore::new());
        let ctx = crate::test_support::context(dir.path(), store.clone());

        let summary = run_load(&ctx).await.unwrap();
        assert_eq!(summary.count("Upserted"), Some(3));
        let listing = summary.section_lines("Verified 3 teams in DB").unwrap();
        assert_eq!(listing[0], format!("{:<4} {:<30} {}", "ARI", "Arizona Cardinals", "NFC"));
        assert!(listing[2].starts_with("KC "));

        let rows = store.rows(TEAMS_TABLE).await;
        let ari = rows.iter().find(|r| r["team_abbr"] == "ARI").unwrap();
        assert!(ari["team_division"].is_null());

        // Re-running merges on team_abbr
        run_load(&ctx).await.unwrap();
        assert_eq!(store.rows(TEAMS_TABLE).await.len(), 3);
    }

    #[tokio::test]
    async fn test_game_stats_types_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("nflreadr").join(TEAM_GAME_STATS_CSV),
            "season,week,team,team_score,spread,qb_fp,qb_fp_ppr\n\
             2024,1,BUF,34,-6.5,24.3,24.3\n\
             2024,2,BUF,NA,3,18.1,18.1\n",
        );
        let store = Arc::new(MemoryStore::new());
        let ctx = crate::test_support::context(dir.path(), store.clone());

        let summary = run_game_stats(&ctx).await.unwrap();
        assert_eq!(summary.count("Rows in team_game_stats"), Some(2));

        let rows = store.rows("team_game_stats").await;
        assert_eq!(rows[0]["team_score"], 34);
        assert_eq!(rows[0]["spread"], -6.5);
        assert_eq!(rows[1]["spread"], 3.0);
        assert!(rows[1]["team_score"].is_null());
        assert!(!rows[0].contains_key("qb_fp_ppr"));
    }
}

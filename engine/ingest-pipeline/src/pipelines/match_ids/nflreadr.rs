//! nflreadr `ff_playerids.csv`: `sportradar_id` is our `player_id`

use super::push_coverage;
use crate::context::IngestContext;
use crate::matched_files::{save_matched, MatchedSource};
use crate::players::load_index;
use crate::report::Summary;
use anyhow::{Context, Result};
use player_identity::{MatchQuery, MatchedIds, NameFallback, PlayerIndex, Resolver};
use source_feeds::nflreadr::FF_PLAYERIDS_CSV;
use source_feeds::{NflreadrDir, NflreadrRecord};
use tracing::info;

/// ff_playerids columns copied onto players (same names in the DB)
pub const NFLREADR_ID_COLUMNS: [&str; 12] = [
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

/// Direct ID match only; nflreadr names are never used here
pub fn match_nflreadr(index: &PlayerIndex, records: &[NflreadrRecord]) -> MatchedIds {
    let resolver = Resolver::new(index, NameFallback::Disabled);
    let mut matched = MatchedIds::new();

    for record in records {
        let query = MatchQuery::default().primary_id(record.opt("sportradar_id"));
        let Some(hit) = resolver.resolve(&query) else {
            continue;
        };
        let updates = NFLREADR_ID_COLUMNS
            .iter()
            .filter_map(|column| record.opt(column).map(|value| (*column, value)));
        matched.record(&hit.player.player_id, updates, hit.method);
    }
    matched
}

pub async fn run(ctx: &IngestContext) -> Result<Summary> {
    let dir = NflreadrDir::new(ctx.layout.nflreadr());
    let records = dir.ff_playerids().with_context(|| {
        format!("{} not found; download it from nflverse first", dir.path(FF_PLAYERIDS_CSV).display())
    })?;
    info!("Loaded {} rows from {}", records.len(), FF_PLAYERIDS_CSV);

    let index = load_index(ctx.store(), &[], &[]).await?;
    let matched = match_nflreadr(&index, &records);
    let path = save_matched(&ctx.layout, MatchedSource::Nflreadr, &matched)?;

    let mut summary = Summary::new("NFLREADR ID MATCH")
        .row("DB players", index.len())
        .row("Matched", matched.len());
    push_coverage(&mut summary, &matched, &NFLREADR_ID_COLUMNS);
    summary.push_row("Saved", path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matched_files::load_matched;
    use crate::test_support::{context, player, store_with_players, write_file};

    #[tokio::test]
    async fn test_matches_by_sportradar_id_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("nflreadr/ff_playerids.csv"),
            "sportradar_id,name,position,mfl_id,pff_id,ktc_id,espn_id\n\
             sr-1,Josh Allen,QB,13589,NA,  ,3918298\n\
             sr-unknown,Lamar Jackson,QB,13116,1,2,3\n\
             NA,Josh Allen,QB,1,2,3,4\n",
        );
        let store = store_with_players(vec![
            player("sr-1", "Josh", "Allen", "QB", "BUF"),
            player("sr-2", "Lamar", "Jackson", "QB", "BAL"),
        ])
        .await;
        let ctx = context(dir.path(), store);

        let summary = run(&ctx).await.unwrap();
        assert_eq!(summary.count("Matched"), Some(1));
        assert_eq!(summary.count("mfl_id"), Some(1));
        assert_eq!(summary.count("pff_id"), Some(0));

        let matched = load_matched(&ctx.layout, MatchedSource::Nflreadr).unwrap().unwrap();
        let ids = matched.get("sr-1").unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids["mfl_id"], "13589");
        assert!(!matched.contains("sr-2"));
    }

    #[tokio::test]
    async fn test_missing_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_players(vec![]).await;
        let ctx = context(dir.path(), store);
        let err = run(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("nflverse"));
    }
}

//! Footballguys IDs via the FBG crosswalk
//!
//! The crosswalk carries SportsData IDs, so rows chain through
//! `sportsdata_ids.json` first and fall back to names.

use crate::context::IngestContext;
use crate::matched_files::{load_matched, save_matched, MatchedSource};
use crate::players::load_index;
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use player_identity::{MatchMethod, MatchQuery, MatchedIds, NameFallback, PlayerIndex, Resolver};
use source_feeds::imports::{read_fbg_crosswalk, FbgCrosswalkRow, FBG_CROSSWALK_CSV};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Default)]
pub struct FbgMatch {
    pub matched: MatchedIds,
    pub via_sportsdata: usize,
    pub via_name: usize,
    pub unmatched: Vec<String>,
}

/// SportsData ID -> player_id from an existing SportsData match
pub fn sportsdata_lookup(sportsdata: &MatchedIds) -> HashMap<String, String> {
    sportsdata
        .iter()
        .filter_map(|(player_id, ids)| {
            ids.get("sportsdata_id")
                .filter(|id| !id.is_empty())
                .map(|id| (id.clone(), player_id.clone()))
        })
        .collect()
}

pub fn match_crosswalk(
    index: &PlayerIndex,
    crosswalk: &[FbgCrosswalkRow],
    sd_to_pid: &HashMap<String, String>,
) -> FbgMatch {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut result = FbgMatch::default();

    for row in crosswalk.iter().filter(|r| !r.id.is_empty()) {
        if let Some(player_id) = row.sportsdata().and_then(|sd| sd_to_pid.get(sd)) {
            result.via_sportsdata += 1;
            let method = MatchMethod::SecondaryId("sportsdata_id".to_string());
            result.matched.record(player_id, [("footballguys_id", row.id.as_str())], method);
            continue;
        }

        let position = row.position.to_uppercase();
        let query = MatchQuery::by_name(&row.name).position(&position);
        match resolver.resolve(&query) {
            Some(hit) => {
                result.via_name += 1;
                result.matched.record(&hit.player.player_id, [("footballguys_id", row.id.as_str())], hit.method);
            }
            None => result
                .unmatched
                .push(format!("{} ({}) - FBG ID: {}", row.name, position, row.id)),
        }
    }
    result
}

pub async fn run(ctx: &IngestContext) -> Result<Summary> {
    let crosswalk = read_fbg_crosswalk(&ctx.layout.imports())
        .with_context(|| format!("Failed to read {}", FBG_CROSSWALK_CSV))?;
    info!("Loaded {} rows from FBG crosswalk", crosswalk.len());

    let sportsdata = load_matched(&ctx.layout, MatchedSource::SportsData)?.unwrap_or_default();
    let sd_to_pid = sportsdata_lookup(&sportsdata);
    info!("Have {} SportsData -> player_id mappings", sd_to_pid.len());

    let index = load_index(ctx.store(), &[], &[]).await?;
    let result = match_crosswalk(&index, &crosswalk, &sd_to_pid);
    let path = save_matched(&ctx.layout, MatchedSource::Footballguys, &result.matched)?;

    Ok(Summary::new("FOOTBALLGUYS ID MATCH")
        .row("Crosswalk rows", crosswalk.len())
        .row("Matched", result.matched.len())
        .row("Via SportsData crosswalk", result.via_sportsdata)
        .row("Via name", result.via_name)
        .row("Unmatched", result.unmatched.len())
        .row("Saved", path.display())
        .section("Unmatched FBG players (first 10)", truncated(result.unmatched, 10)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players, write_file};

    #[tokio::test]
    async fn test_chains_through_sportsdata_then_names() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("imports/fbg_crosswalk.csv"),
            "ID,Name,SportsDataIO ID,Position\n\
             AlleJo02,Joshua Allen,19801,QB\n\
             RobiBi00,Bijan Robinson,-,RB\n\
             ,Blank Id,1,WR\n\
             NewRo01,New Rookie,-,WR\n",
        );
        let store = store_with_players(vec![
            player("sr-allen", "Josh", "Allen", "QB", "BUF"),
            player("sr-bijan", "Bijan", "Robinson", "RB", "ATL"),
        ])
        .await;
        let ctx = context(dir.path(), store);

        let mut sportsdata = MatchedIds::new();
        sportsdata.record("sr-allen", [("sportsdata_id", "19801")], MatchMethod::NamePosition);
        save_matched(&ctx.layout, MatchedSource::SportsData, &sportsdata).unwrap();

        let summary = run(&ctx).await.unwrap();
        assert_eq!(summary.count("Crosswalk rows"), Some(4));
        assert_eq!(summary.count("Via SportsData crosswalk"), Some(1));
        assert_eq!(summary.count("Via name"), Some(1));
        assert_eq!(summary.count("Unmatched"), Some(1));
        assert_eq!(
            summary.section_lines("Unmatched FBG players (first 10)").unwrap(),
            ["New Rookie (WR) - FBG ID: NewRo01"]
        );

        let matched = load_matched(&ctx.layout, MatchedSource::Footballguys).unwrap().unwrap();
        assert_eq!(matched.get("sr-allen").unwrap()["footballguys_id"], "AlleJo02");
        assert_eq!(matched.get("sr-bijan").unwrap()["footballguys_id"], "RobiBi00");
    }
}

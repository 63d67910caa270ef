//! Draft-site exports: Underdog, DraftKings and Drafters
//!
//! All three are matched by name + position, then name, and carry a single
//! site ID.

use super::{adp_listing, Unmatched, UNKNOWN_ADP};
use crate::context::IngestContext;
use crate::layout::write_json;
use crate::matched_files::{save_matched, MatchedSource, UNDERDOG_UNMATCHED};
use crate::players::load_index;
use crate::report::Summary;
use anyhow::{Context, Result};
use player_identity::{
    normalize_team, team_abbr_from_full_name, MatchQuery, MatchedIds, NameFallback, PlayerIndex,
    Resolver,
};
use serde::Serialize;
use source_feeds::imports::{
    parse_number, read_draftkings, read_drafters, DRAFTERS_CSV, DRAFTKINGS_CSV, UNDERDOG_ADP_CSV,
};
use source_feeds::underdog::read_rankings;
use tracing::info;

/// A draft-site row reduced to what matching needs
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub team: String,
    pub adp: f64,
}

/// Resolve site rows, storing `column = id` for each hit
///
/// Rows without an ID count as unmatched.
pub fn match_site_rows(index: &PlayerIndex, rows: &[SiteRow], column: &str) -> (MatchedIds, Vec<Unmatched>) {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut matched = MatchedIds::new();
    let mut unmatched = Vec::new();

    for row in rows {
        let query = MatchQuery::by_name(&row.name).position(&row.position);
        match resolver.resolve(&query) {
            Some(hit) if !row.id.is_empty() => {
                matched.record(&hit.player.player_id, [(column, row.id.as_str())], hit.method);
            }
            _ => unmatched.push(Unmatched {
                name: row.name.clone(),
                pos: row.position.clone(),
                team: row.team.clone(),
                adp: row.adp,
                source_id: row.id.clone(),
            }),
        }
    }
    (matched, unmatched)
}

fn adp_or_unknown(cell: &str) -> f64 {
    parse_number(cell).unwrap_or(UNKNOWN_ADP)
}

/// Underdog unmatched entry as saved for `ids add-missing`
#[derive(Debug, Clone, PartialEq, Serialize)]
struct UnderdogUnmatched<'a> {
    name: &'a str,
    pos: &'a str,
    team: &'a str,
    adp: f64,
    underdog_id: &'a str,
}

struct SiteSpec {
    title: &'static str,
    source: MatchedSource,
    column: &'static str,
    id_label: &'static str,
    file: &'static str,
    below: f64,
    limit: usize,
}

async fn match_and_save(ctx: &IngestContext, spec: &SiteSpec, rows: Vec<SiteRow>) -> Result<(Summary, Vec<Unmatched>)> {
    info!("Loaded {} players from {}", rows.len(), spec.file);
    let index = load_index(ctx.store(), &[], &[]).await?;
    let (matched, unmatched) = match_site_rows(&index, &rows, spec.column);
    let path = save_matched(&ctx.layout, spec.source, &matched)?;

    let heading = format!("Unmatched with ADP < {}", spec.below);
    let listing = adp_listing(&index, &unmatched, spec.below, spec.limit, spec.id_label);
    let summary = Summary::new(spec.title)
        .row("Rows", rows.len())
        .row("Matched", matched.len())
        .row("Unmatched", unmatched.len())
        .row("Saved", path.display())
        .section(&heading, listing);
    Ok((summary, unmatched))
}

pub async fn run_underdog(ctx: &IngestContext) -> Result<Summary> {
    let path = ctx.layout.imports().join(UNDERDOG_ADP_CSV);
    let rankings = read_rankings(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let rows = rankings
        .iter()
        .map(|r| SiteRow {
            id: r.id.clone(),
            name: r.full_name(),
            position: r.slot_name.to_uppercase(),
            team: team_abbr_from_full_name(&r.team_name).unwrap_or_default().to_string(),
            adp: adp_or_unknown(&r.adp),
        })
        .collect();

    let spec = SiteSpec {
        title: "UNDERDOG ID MATCH",
        source: MatchedSource::Underdog,
        column: "underdog_id",
        id_label: "UD ID",
        file: UNDERDOG_ADP_CSV,
        below: 300.0,
        limit: 30,
    };
    let (summary, unmatched) = match_and_save(ctx, &spec, rows).await?;

    let saved: Vec<UnderdogUnmatched> = {
        let mut sorted: Vec<&Unmatched> = unmatched.iter().collect();
        sorted.sort_by(|a, b| a.adp.total_cmp(&b.adp));
        sorted
            .into_iter()
            .map(|u| UnderdogUnmatched {
                name: &u.name,
                pos: &u.pos,
                team: &u.team,
                adp: u.adp,
                underdog_id: &u.source_id,
            })
            .collect()
    };
    let unmatched_path = ctx.layout.matched_file(UNDERDOG_UNMATCHED);
    write_json(&unmatched_path, &saved)?;
    Ok(summary.row("Unmatched file", unmatched_path.display()))
}

pub async fn run_draftkings(ctx: &IngestContext) -> Result<Summary> {
    let rankings = read_draftkings(&ctx.layout.imports()).context("Failed to read DraftKings export")?;
    let rows = rankings
        .iter()
        .map(|r| SiteRow {
            id: r.id.clone(),
            name: r.name.clone(),
            position: r.position.to_uppercase(),
            team: normalize_team(&r.team),
            adp: adp_or_unknown(&r.adp),
        })
        .collect();

    let spec = SiteSpec {
        title: "DRAFTKINGS ID MATCH",
        source: MatchedSource::DraftKings,
        column: "draftkings_id",
        id_label: "DK ID",
        file: DRAFTKINGS_CSV,
        below: 200.0,
        limit: 20,
    };
    Ok(match_and_save(ctx, &spec, rows).await?.0)
}

pub async fn run_drafters(ctx: &IngestContext) -> Result<Summary> {
    let players = read_drafters(&ctx.layout.imports()).context("Failed to read Drafters export")?;
    let rows = players
        .iter()
        .map(|p| SiteRow {
            id: p.clean_id().to_string(),
            name: p.name.clone(),
            position: p.position.to_uppercase(),
            team: normalize_team(&p.team),
            adp: adp_or_unknown(&p.adp),
        })
        .collect();

    let spec = SiteSpec {
        title: "DRAFTERS ID MATCH",
        source: MatchedSource::Drafters,
        column: "drafters_id",
        id_label: "DR ID",
        file: DRAFTERS_CSV,
        below: 200.0,
        limit: 20,
    };
    Ok(match_and_save(ctx, &spec, rows).await?.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matched_files::load_matched;
    use crate::test_support::{context, player, store_with_players, write_file};

    async fn fixture(dir: &std::path::Path) -> IngestContext {
        let store = store_with_players(vec![
            player("sr-chase", "Ja'Marr", "Chase", "WR", "CIN"),
            player("sr-brown", "Hollywood", "Brown", "WR", "KC"),
            player("sr-bijan", "Bijan", "Robinson", "RB", "ATL"),
        ])
        .await;
        context(dir, store)
    }

    #[tokio::test]
    async fn test_underdog_match_and_unmatched_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("imports/underdog_ADP.csv"),
            "id,firstName,lastName,adp,projectedPoints,positionRank,slotName,teamName\n\
             ud-1,JaMarr,Chase,1.2,300.5,WR1,WR,Cincinnati Bengals\n\
             ud-2,Marquise,Brown,80.1,150,WR40,WR,Kansas City Chiefs\n\
             ud-3,Rookie,Runner,45.0,0.0,RB20,RB,San Francisco 49ers\n\
             ud-4,Deep,Sleeper,-,0.0,,TE,\n",
        );
        let ctx = fixture(dir.path()).await;

        let summary = run_underdog(&ctx).await.unwrap();
        assert_eq!(summary.count("Matched"), Some(2));
        assert_eq!(summary.count("Unmatched"), Some(2));

        let matched = load_matched(&ctx.layout, MatchedSource::Underdog).unwrap().unwrap();
        assert_eq!(matched.get("sr-chase").unwrap()["underdog_id"], "ud-1");
        assert_eq!(matched.get("sr-brown").unwrap()["underdog_id"], "ud-2");

        let unmatched: Vec<serde_json::Value> =
            crate::layout::read_json(&ctx.layout.matched_file(UNDERDOG_UNMATCHED)).unwrap();
        assert_eq!(unmatched[0]["name"], "Rookie Runner");
        assert_eq!(unmatched[0]["team"], "SF");
        assert_eq!(unmatched[1]["adp"], 999.0);

        let listing = summary.section_lines("Unmatched with ADP < 300").unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[tokio::test]
    async fn test_drafters_ids_are_unquoted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("imports/drafters_players.csv"),
            "id,name,position,team abbr,ADP\n\
             \"\"\"abc-123\"\"\",Bijan Robinson,RB,ATL,2.5\n\
             ,Ja'Marr Chase,WR,CIN,1.0\n",
        );
        let ctx = fixture(dir.path()).await;

        let summary = run_drafters(&ctx).await.unwrap();
        assert_eq!(summary.count("Matched"), Some(1));
        assert_eq!(summary.count("Unmatched"), Some(1));

        let matched = load_matched(&ctx.layout, MatchedSource::Drafters).unwrap().unwrap();
        assert_eq!(matched.get("sr-bijan").unwrap()["drafters_id"], "abc-123");
    }

    #[tokio::test]
    async fn test_draftkings_name_only_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("imports/DkPreDraftRankings.csv"),
            "ID,Name,Position,Team,ADP\n\
             40001,Bijan Robinson,FLEX,ATL,3.0\n",
        );
        let ctx = fixture(dir.path()).await;

        run_draftkings(&ctx).await.unwrap();
        let matched = load_matched(&ctx.layout, MatchedSource::DraftKings).unwrap().unwrap();
        assert_eq!(matched.get("sr-bijan").unwrap()["draftkings_id"], "40001");
    }
}

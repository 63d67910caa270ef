//! SportsData.io players and the rookie class

use super::push_coverage;
use crate::context::IngestContext;
use crate::layout::write_json;
use crate::matched_files::{
    load_matched, save_matched, MatchedSource, SPORTSDATA_CACHE, SPORTSDATA_UNMATCHED_ROOKIES,
};
use crate::players::load_index;
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use player_identity::{
    is_skill_position, normalize_team, MatchQuery, MatchedIds, NameFallback, PlayerIndex, Resolver,
};
use serde::Serialize;
use source_feeds::{SportsDataClient, SportsDataPlayer};
use tracing::info;

pub const SPORTSDATA_ID_COLUMNS: [&str; 3] = ["sportsdata_id", "fanduel_id", "draftkings_id"];

/// The three vendor IDs a SportsData player carries
pub fn sportsdata_ids(player: &SportsDataPlayer) -> [(&'static str, String); 3] {
    [
        ("sportsdata_id", player.player_id.to_string()),
        ("fanduel_id", player.fanduel_id.clone().unwrap_or_default()),
        ("draftkings_id", player.draftkings_id.clone().unwrap_or_default()),
    ]
}

/// Result of matching the full SportsData player list
#[derive(Debug, Default)]
pub struct SportsDataMatch {
    pub matched: MatchedIds,
    /// Unmatched skill-position players as display lines
    pub unmatched: Vec<String>,
}

/// Name + position, then name; team defenses are skipped
pub fn match_players(index: &PlayerIndex, players: &[SportsDataPlayer]) -> SportsDataMatch {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut result = SportsDataMatch::default();

    for player in players {
        let position = player.position_code();
        if position == "DEF" || position == "DST" {
            continue;
        }
        let name = player.full_name();
        let query = MatchQuery::by_name(&name).position(&position);
        match resolver.resolve(&query) {
            Some(hit) => {
                result.matched.record(&hit.player.player_id, sportsdata_ids(player), hit.method);
            }
            None if is_skill_position(&position) => result.unmatched.push(format!(
                "{} ({}, {}) - SD ID: {}",
                name,
                position,
                player.team.as_deref().unwrap_or_default(),
                player.player_id
            )),
            None => {}
        }
    }
    result
}

pub async fn run(ctx: &IngestContext, client: &SportsDataClient) -> Result<Summary> {
    info!("Fetching players from SportsData.io...");
    let players = client.players().await.context("Failed to fetch SportsData players")?;
    info!("Got {} players from SportsData.io", players.len());
    run_with(ctx, players).await
}

/// Match an already-fetched player list and write the matched file and cache
pub async fn run_with(ctx: &IngestContext, players: Vec<SportsDataPlayer>) -> Result<Summary> {
    let index = load_index(ctx.store(), &[], &[]).await?;
    let result = match_players(&index, &players);

    let path = save_matched(&ctx.layout, MatchedSource::SportsData, &result.matched)?;
    let cache = ctx.layout.matched_file(SPORTSDATA_CACHE);
    write_json(&cache, &players)?;
    info!("Cached full SportsData player list to {}", cache.display());

    let mut summary = Summary::new("SPORTSDATA ID MATCH")
        .row("SportsData players", players.len())
        .row("DB players", index.len())
        .row("Matched", result.matched.len());
    push_coverage(&mut summary, &result.matched, &SPORTSDATA_ID_COLUMNS);
    summary.push_row("Unmatched skill players", result.unmatched.len());
    summary.push_row("Saved", path.display());
    summary.push_section("Unmatched skill players (first 20)", truncated(result.unmatched, 20));
    Ok(summary)
}

/// A rookie with no DB row yet; candidates for `ids add-missing`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRookie {
    pub name: String,
    pub pos: String,
    pub team: String,
    pub sportradar_id: String,
    pub sportsdata_id: i64,
    pub fanduel_id: Option<String>,
    pub draftkings_id: Option<String>,
    pub college: Option<String>,
    pub draft_round: Option<i64>,
    pub draft_pick: Option<i64>,
    pub height: Option<String>,
    pub weight: Option<i64>,
}

/// Result of merging a rookie class into the SportsData matches
#[derive(Debug, Default)]
pub struct RookieMatch {
    pub skill_rookies: usize,
    pub matched: usize,
    /// ID values that were not already present
    pub new_ids: usize,
    pub unmatched: Vec<UnmatchedRookie>,
}

/// Sportradar ID, then name + position, then name; fills gaps in `existing`
pub fn merge_rookies(
    index: &PlayerIndex,
    rookies: &[SportsDataPlayer],
    existing: &mut MatchedIds,
) -> RookieMatch {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut result = RookieMatch::default();

    for rookie in rookies.iter().filter(|r| is_skill_position(&r.position_code())) {
        result.skill_rookies += 1;
        let name = rookie.full_name();
        let position = rookie.position_code();
        let query = MatchQuery::by_name(&name)
            .position(&position)
            .primary_id(rookie.sportradar_id.as_deref());

        match resolver.resolve(&query) {
            Some(hit) => {
                result.matched += 1;
                result.new_ids += existing.fill_gaps(&hit.player.player_id, sportsdata_ids(rookie));
            }
            None => result.unmatched.push(UnmatchedRookie {
                name,
                pos: position,
                team: normalize_team(rookie.team.as_deref().unwrap_or_default()),
                sportradar_id: rookie.sportradar_id.clone().unwrap_or_default(),
                sportsdata_id: rookie.player_id,
                fanduel_id: rookie.fanduel_id.clone(),
                draftkings_id: rookie.draftkings_id.clone(),
                college: rookie.college.clone(),
                draft_round: rookie.draft_round,
                draft_pick: rookie.draft_pick,
                height: rookie.height.clone(),
                weight: rookie.weight,
            }),
        }
    }
    result
}

pub async fn run_rookies(ctx: &IngestContext, client: &SportsDataClient) -> Result<Summary> {
    let season = ctx.year();
    info!("Fetching {} rookies from SportsData.io...", season);
    let rookies = client.rookies(season).await.context("Failed to fetch SportsData rookies")?;
    info!("Got {} rookies from SportsData.io", rookies.len());
    run_rookies_with(ctx, rookies).await
}

pub async fn run_rookies_with(ctx: &IngestContext, rookies: Vec<SportsDataPlayer>) -> Result<Summary> {
    let index = load_index(ctx.store(), &[], &[]).await?;
    let mut existing = load_matched(&ctx.layout, MatchedSource::SportsData)?.unwrap_or_default();

    let result = merge_rookies(&index, &rookies, &mut existing);
    let path = save_matched(&ctx.layout, MatchedSource::SportsData, &existing)?;
    let unmatched_path = ctx.layout.matched_file(SPORTSDATA_UNMATCHED_ROOKIES);
    write_json(&unmatched_path, &result.unmatched)?;

    let listing = result
        .unmatched
        .iter()
        .map(|u| {
            format!(
                "{:30} {:3} {:4}  SR={:.8}  SD={}  College={}",
                u.name,
                u.pos,
                u.team,
                u.sportradar_id,
                u.sportsdata_id,
                u.college.as_deref().unwrap_or_default()
            )
        })
        .collect();

    Ok(Summary::new(&format!("SPORTSDATA {} ROOKIES", ctx.year()))
        .row("Rookies", rookies.len())
        .row("Skill-position rookies", result.skill_rookies)
        .row("Matched", result.matched)
        .row("New ID values", result.new_ids)
        .row("Unmatched", result.unmatched.len())
        .row("Saved", path.display())
        .row("Unmatched file", unmatched_path.display())
        .section("Unmatched rookies (potential additions)", listing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players};
    use player_identity::PlayerRow;
    use serde_json::json;

    fn sd(value: serde_json::Value) -> SportsDataPlayer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_match_players_skips_defenses() {
        let index = PlayerIndex::build(vec![
            PlayerRow::new("p1", "Travis", "Kelce", "TE"),
            PlayerRow::new("p2", "Kansas City", "", "DEF"),
        ]);
        let players = vec![
            sd(json!({"PlayerID": 15048, "FirstName": "Travis", "LastName": "Kelce", "Position": "TE",
                      "FanDuelPlayerID": 9999, "DraftKingsPlayerID": null})),
            sd(json!({"PlayerID": 1, "FirstName": "Kansas City", "LastName": "", "Position": "DEF"})),
            sd(json!({"PlayerID": 2, "FirstName": "Nobody", "LastName": "Here", "Position": "WR", "Team": "KC"})),
            sd(json!({"PlayerID": 3, "FirstName": "Long", "LastName": "Snapper", "Position": "LS"})),
        ];

        let result = match_players(&index, &players);
        assert_eq!(result.matched.len(), 1);
        let ids = result.matched.get("p1").unwrap();
        assert_eq!(ids["sportsdata_id"], "15048");
        assert_eq!(ids["fanduel_id"], "9999");
        assert!(!ids.contains_key("draftkings_id"));
        assert_eq!(result.unmatched, vec!["Nobody Here (WR, KC) - SD ID: 2"]);
    }

    #[tokio::test]
    async fn test_rookies_fill_gaps_and_write_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_players(vec![
            player("sr-rookie", "Cam", "Ward", "QB", "TEN"),
            player("sr-vet", "Ashton", "Jeanty", "RB", "LV"),
        ])
        .await;
        let ctx = context(dir.path(), store);

        let mut existing = MatchedIds::new();
        existing.fill_gaps("sr-vet", [("sportsdata_id", "1111")]);
        save_matched(&ctx.layout, MatchedSource::SportsData, &existing).unwrap();

        let rookies = vec![
            sd(json!({"PlayerID": 25001, "FirstName": "Cam", "LastName": "Ward", "Position": "QB",
                      "SportRadarPlayerID": "sr-rookie", "FanDuelPlayerID": "fd-1"})),
            sd(json!({"PlayerID": 25002, "FirstName": "Ashton", "LastName": "Jeanty", "Position": "RB",
                      "DraftKingsPlayerID": 77})),
            sd(json!({"PlayerID": 25003, "FirstName": "Brand", "LastName": "New", "Position": "WR",
                      "Team": "JAC", "College": "Ohio State", "DraftRound": 1, "DraftPick": 20})),
            sd(json!({"PlayerID": 25004, "FirstName": "Big", "LastName": "Tackle", "Position": "OT"})),
        ];

        let summary = run_rookies_with(&ctx, rookies).await.unwrap();
        assert_eq!(summary.count("Skill-position rookies"), Some(3));
        assert_eq!(summary.count("Matched"), Some(2));
        assert_eq!(summary.count("New ID values"), Some(3));

        let merged = load_matched(&ctx.layout, MatchedSource::SportsData).unwrap().unwrap();
        assert_eq!(merged.get("sr-vet").unwrap()["sportsdata_id"], "1111");
        assert_eq!(merged.get("sr-vet").unwrap()["draftkings_id"], "77");
        assert_eq!(merged.get("sr-rookie").unwrap()["fanduel_id"], "fd-1");

        let unmatched: serde_json::Value = crate::layout::read_json(
            &ctx.layout.matched_file(SPORTSDATA_UNMATCHED_ROOKIES),
        )
        .unwrap();
        assert_eq!(unmatched[0]["name"], "Brand New");
        assert_eq!(unmatched[0]["team"], "JAX");
        assert_eq!(unmatched[0]["draft_pick"], 20);
    }
}

//! Sleeper's full player map

use crate::context::IngestContext;
use crate::layout::write_json;
use crate::matched_files::{save_matched, MatchedSource, SLEEPER_CACHE, SLEEPER_UNMATCHED_ROOKIES};
use crate::players::load_index;
use crate::report::Summary;
use anyhow::{Context, Result};
use player_identity::{
    is_skill_position, normalize_team, MatchQuery, MatchedIds, NameFallback, PlayerIndex, Resolver,
};
use serde::Serialize;
use source_feeds::{SleeperClient, SleeperPlayer, SleeperPlayers};
use std::collections::BTreeMap;
use tracing::info;

/// Sleeper field name -> players column
fn db_column(sleeper_field: &'static str) -> &'static str {
    match sleeper_field {
        "player_id" => "sleeper_id",
        other => other,
    }
}

/// An unmatched first-year player on an NFL roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedSleeperRookie {
    pub sleeper_id: String,
    pub name: String,
    pub pos: String,
    pub team: String,
    pub sportradar_id: String,
    pub years_exp: Option<i64>,
    pub status: String,
    pub search_rank: Option<i64>,
}

#[derive(Debug, Default)]
pub struct SleeperMatch {
    pub matched: MatchedIds,
    pub by_sportradar: usize,
    pub by_name: usize,
    pub unmatched_total: usize,
    /// Sorted by search rank
    pub unmatched_rookies: Vec<UnmatchedSleeperRookie>,
    /// Skill-position players with a name, keyed by Sleeper ID
    pub cache: BTreeMap<String, SleeperPlayer>,
}

/// Sportradar ID, then name + position, then name when positions agree
pub fn match_players(index: &PlayerIndex, players: &SleeperPlayers) -> SleeperMatch {
    let resolver = Resolver::new(index, NameFallback::SamePosition);
    let mut result = SleeperMatch::default();

    let sorted: BTreeMap<&String, &SleeperPlayer> = players.iter().collect();
    for (sleeper_id, player) in sorted {
        let position = player.position_code();
        if !is_skill_position(&position) || !player.has_name() {
            continue;
        }
        result.cache.insert(sleeper_id.clone(), player.clone());

        let name = player.full_name();
        let query = MatchQuery::by_name(&name)
            .position(&position)
            .primary_id(player.sportradar_id.as_deref());

        let Some(hit) = resolver.resolve(&query) else {
            if player.is_current() {
                result.unmatched_total += 1;
                let team = normalize_team(player.team.as_deref().unwrap_or_default());
                if player.years_exp == Some(0) && !team.is_empty() {
                    result.unmatched_rookies.push(UnmatchedSleeperRookie {
                        sleeper_id: sleeper_id.clone(),
                        name,
                        pos: position,
                        team,
                        sportradar_id: player.sportradar_id.clone().unwrap_or_default(),
                        years_exp: player.years_exp,
                        status: player.status.clone().unwrap_or_default(),
                        search_rank: player.search_rank,
                    });
                }
            }
            continue;
        };

        if hit.method.is_primary() {
            result.by_sportradar += 1;
        } else {
            result.by_name += 1;
        }

        let updates = player
            .id_fields(sleeper_id)
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (db_column(field), v)));
        result.matched.record(&hit.player.player_id, updates, hit.method);
    }

    result.unmatched_rookies.sort_by_key(|r| r.search_rank.unwrap_or(source_feeds::sleeper::UNRANKED));
    result
}

pub async fn run(ctx: &IngestContext, client: &SleeperClient) -> Result<Summary> {
    info!("Fetching players from Sleeper API...");
    let players = client.players().await.context("Failed to fetch Sleeper players")?;
    info!("Got {} entries from Sleeper", players.len());
    run_with(ctx, players).await
}

pub async fn run_with(ctx: &IngestContext, players: SleeperPlayers) -> Result<Summary> {
    let index = load_index(ctx.store(), &[], &[]).await?;
    let result = match_players(&index, &players);

    let path = save_matched(&ctx.layout, MatchedSource::Sleeper, &result.matched)?;
    write_json(&ctx.layout.matched_file(SLEEPER_UNMATCHED_ROOKIES), &result.unmatched_rookies)?;
    write_json(&ctx.layout.matched_file(SLEEPER_CACHE), &result.cache)?;

    let mut summary = Summary::new("SLEEPER ID MATCH")
        .row("Skill-position players", result.cache.len())
        .row("DB players", index.len())
        .row("Matched", result.matched.len())
        .row("By sportradar_id", result.by_sportradar)
        .row("By name", result.by_name);
    for column in result.matched.columns() {
        summary.push_row(&column, result.matched.column_count(&column));
    }

    let rookies = result
        .unmatched_rookies
        .iter()
        .take(25)
        .map(|u| {
            format!(
                "{:30} {:3} {:4}  SR={:.8}...  rank={}",
                u.name,
                u.pos,
                u.team,
                u.sportradar_id,
                u.search_rank.map_or("N/A".to_string(), |r| r.to_string())
            )
        })
        .collect();

    Ok(summary
        .row("Unmatched total", result.unmatched_total)
        .row("Unmatched rookies with NFL teams", result.unmatched_rookies.len())
        .row("Saved", path.display())
        .section("Top unmatched rookies (by search rank)", rookies))
}

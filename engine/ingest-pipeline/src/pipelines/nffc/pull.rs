//! `nffc pull`: league lists, draft results and league details per season

use super::seasons;
use crate::context::IngestContext;
use crate::layout::{read_json_if_exists, write_json, DataLayout};
use crate::report::Summary;
use anyhow::Result;
use serde_json::{Map, Value};
use source_feeds::{LeagueDraft, LeagueFetch, NffcClient, NffcLeague};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Where league lists and per-league data come from
#[async_trait::async_trait]
pub trait DraftSource: Send + Sync {
    async fn leagues(&self, season: i32) -> source_feeds::Result<Vec<NffcLeague>>;

    async fn fetch_leagues(&self, season: i32, leagues: Vec<NffcLeague>) -> Vec<LeagueFetch>;
}

#[async_trait::async_trait]
impl DraftSource for NffcClient {
    async fn leagues(&self, season: i32) -> source_feeds::Result<Vec<NffcLeague>> {
        NffcClient::leagues(self, season).await
    }

    async fn fetch_leagues(&self, season: i32, leagues: Vec<NffcLeague>) -> Vec<LeagueFetch> {
        NffcClient::fetch_leagues(self, season, leagues).await
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct SeasonPull {
    pub season: i32,
    pub leagues: usize,
    pub drafts: usize,
    pub details: usize,
    pub errors: usize,
    pub skipped: bool,
}

impl SeasonPull {
    fn line(&self) -> String {
        if self.skipped {
            format!("{}: already pulled ({} leagues with drafts)", self.season, self.drafts)
        } else {
            format!(
                "{}: {} leagues, {} drafts ({} errors), {} league details",
                self.season, self.leagues, self.drafts, self.errors, self.details
            )
        }
    }
}

/// League list from the cache, else the API (then cached)
async fn season_leagues(layout: &DataLayout, source: &dyn DraftSource, season: i32) -> Result<Vec<NffcLeague>> {
    let cache = layout.nffc_leagues_file(season);
    if let Some(leagues) = read_json_if_exists::<Vec<NffcLeague>>(&cache)? {
        return Ok(leagues);
    }
    match source.leagues(season).await {
        Ok(leagues) => {
            write_json(&cache, &leagues)?;
            Ok(leagues)
        }
        Err(e) => {
            warn!(season, error = %e, "League list unavailable");
            Ok(Vec::new())
        }
    }
}

pub async fn pull_season(layout: &DataLayout, source: &dyn DraftSource, season: i32) -> Result<SeasonPull> {
    let drafts_file = layout.nffc_drafts_file(season);
    let details_file = layout.nffc_details_file(season);

    if drafts_file.exists() && details_file.exists() {
        let existing: Map<String, Value> = read_json_if_exists(&drafts_file)?.unwrap_or_default();
        info!("{}: already pulled ({} leagues with drafts)", season, existing.len());
        return Ok(SeasonPull { season, drafts: existing.len(), skipped: true, ..SeasonPull::default() });
    }

    let leagues = season_leagues(layout, source, season).await?;
    info!("{}: {} leagues to process...", season, leagues.len());
    let mut pull = SeasonPull { season, leagues: leagues.len(), ..SeasonPull::default() };

    let mut drafts: BTreeMap<String, LeagueDraft> = BTreeMap::new();
    let mut details: BTreeMap<String, Value> = BTreeMap::new();
    for fetch in source.fetch_leagues(season, leagues).await {
        let key = fetch.league.id.to_string();
        match fetch.picks {
            Some(picks) => {
                drafts.insert(
                    key.clone(),
                    LeagueDraft { league_id: fetch.league.id, league_name: fetch.league.name.clone(), picks },
                );
            }
            None => pull.errors += 1,
        }
        if let Some(detail) = fetch.detail {
            details.insert(key, detail);
        }
    }

    pull.drafts = drafts.len();
    pull.details = details.len();
    write_json(&drafts_file, &drafts)?;
    info!("{}: saved {} drafts ({} errors)", season, drafts.len(), pull.errors);
    if !details.is_empty() {
        write_json(&details_file, &details)?;
        info!("{}: saved {} league details", season, details.len());
    }
    Ok(pull)
}

pub async fn run(ctx: &IngestContext, source: &dyn DraftSource) -> Result<Summary> {
    let mut pulls = Vec::new();
    for season in seasons(ctx) {
        pulls.push(pull_season(&ctx.layout, source, season).await?);
    }

    let pulled: Vec<&SeasonPull> = pulls.iter().filter(|p| !p.skipped).collect();
    Ok(Summary::new("NFFC DRAFT PULL")
        .row("Seasons", pulls.len())
        .row("Skipped (already pulled)", pulls.len() - pulled.len())
        .row("Drafts saved", pulled.iter().map(|p| p.drafts).sum::<usize>())
        .row("League details saved", pulled.iter().map(|p| p.details).sum::<usize>())
        .row("Errors", pulled.iter().map(|p| p.errors).sum::<usize>())
        .section("Seasons", pulls.iter().map(SeasonPull::line).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves two leagues per season; league 2 has no draft
    #[derive(Default)]
    struct FakeSource {
        league_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DraftSource for FakeSource {
        async fn leagues(&self, _season: i32) -> source_feeds::Result<Vec<NffcLeague>> {
            self.league_calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(json!([
                {"id": 1, "name": "Rotowire Online Championship #1"},
                {"id": "2", "name": "Main Event"}
            ]))
            .unwrap())
        }

        async fn fetch_leagues(&self, _season: i32, leagues: Vec<NffcLeague>) -> Vec<LeagueFetch> {
            leagues
                .into_iter()
                .map(|league| {
                    let picks = (league.id == 1).then(|| vec![json!({"round": 1, "pick": 1, "team": 3, "player": "sr-1"})]);
                    LeagueFetch { detail: Some(json!({"league": {"name": league.name}, "teams": []})), picks, league }
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn test_pull_saves_and_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let source = FakeSource::default();

        let first = pull_season(&layout, &source, 2024).await.unwrap();
        assert_eq!(first, SeasonPull { season: 2024, leagues: 2, drafts: 1, details: 2, errors: 1, skipped: false });

        let drafts: BTreeMap<String, LeagueDraft> =
            crate::layout::read_json(&layout.nffc_drafts_file(2024)).unwrap();
        assert_eq!(drafts["1"].league_name, "Rotowire Online Championship #1");
        assert!(layout.nffc_leagues_file(2024).exists());

        let second = pull_season(&layout, &source, 2024).await.unwrap();
        assert!(second.skipped);
        assert_eq!(second.drafts, 1);
        assert_eq!(source.league_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_league_list_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_json(&layout.nffc_leagues_file(2019), &json!([{"id": 9, "name": "Cached Online Rotowire"}])).unwrap();
        let source = FakeSource::default();

        let pull = pull_season(&layout, &source, 2019).await.unwrap();
        assert_eq!(pull.leagues, 1);
        assert_eq!(source.league_calls.load(Ordering::SeqCst), 0);
    }
}

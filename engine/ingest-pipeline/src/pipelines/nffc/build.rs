//! `nffc build`: tidy CSVs in `data/clean/` from the raw pulls
//!
//! Leagues come from the season list filtered to Rotowire Online
//! Championship names, and must have a league detail. Players are every
//! UUID seen in picks or ADP, enriched from nflreadr by sportradar ID.

use super::{seasons, ADP_CSV, DRAFT_PICKS_CSV, LEAGUES_CSV, LEAGUE_TEAMS_CSV, PLAYERS_CSV, TEAMS_PER_LEAGUE};
use crate::context::IngestContext;
use crate::layout::{read_json_if_exists, DataLayout};
use crate::pipelines::or_empty;
use crate::report::Summary;
use anyhow::{Context, Result};
use source_feeds::nffc::AdpPlayerInfo;
use source_feeds::nflreadr::FF_PLAYERIDS_CSV;
use source_feeds::{
    write_csv, AdpEntry, LeagueDetail, LeagueDraft, NffcLeague, NffcPick, NflreadrDir, NflreadrRecord, TeamOutcome,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::ops::RangeInclusive;
use tracing::{info, warn};

pub const LEAGUE_COLUMNS: [&str; 7] = [
    "league_id",
    "year",
    "name",
    "roster_size",
    "third_round_reversal",
    "draft_date",
    "draft_completed_date",
];

pub const LEAGUE_TEAM_COLUMNS: [&str; 8] = [
    "league_id",
    "year",
    "team_id",
    "draft_order",
    "league_rank",
    "league_points",
    "overall_rank",
    "overall_points",
];

pub const PICK_COLUMNS: [&str; 9] = [
    "league_id",
    "year",
    "round",
    "pick_in_round",
    "overall_pick",
    "team_id",
    "player_id",
    "timestamp",
    "pick_duration",
];

pub const ADP_COLUMNS: [&str; 6] = ["player_id", "year", "adp", "min_pick", "max_pick", "times_drafted"];

#[rustfmt::skip]
pub const PLAYER_COLUMNS: [&str; 18] = [
    "player_id", "first_name", "last_name", "position", "birth_date",
    "gsis_id", "espn_id", "yahoo_id", "sleeper_id", "pfr_id", "rotowire_id",
    "headshot_url", "college", "draft_year", "draft_round", "draft_pick",
    "latest_team", "status",
];

const DEFAULT_ROSTER_SIZE: i64 = 20;

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Python-style booleans, which `nffc load` reads back case-insensitively
fn bool_cell(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Clean tables as CSV cells, in column order
#[derive(Debug, Default)]
pub struct CleanDataset {
    pub leagues: Vec<Vec<String>>,
    pub league_teams: Vec<Vec<String>>,
    pub draft_picks: Vec<Vec<String>>,
    pub adp: Vec<Vec<String>>,
    pub players: Vec<Vec<String>>,
    pub skipped_seasons: Vec<i32>,
    pub bad_picks: usize,
    pub matched: usize,
    pub unmatched: usize,
}

fn league_row(league_id: i64, year: i32, detail: &LeagueDetail) -> Vec<String> {
    let info = &detail.league;
    vec![
        league_id.to_string(),
        year.to_string(),
        info.name.clone().unwrap_or_default(),
        info.roster_size.unwrap_or(DEFAULT_ROSTER_SIZE).to_string(),
        bool_cell(info.has_third_round_reversal()),
        cell(info.draft_date.as_deref()),
        cell(info.draft_completed_date.as_deref()),
    ]
}

fn team_row(league_id: i64, year: i32, team: &TeamOutcome) -> Vec<String> {
    vec![
        league_id.to_string(),
        year.to_string(),
        team.id.to_string(),
        cell(team.draft_order),
        cell(team.league_rank),
        cell(team.league_points),
        cell(team.overall_rank),
        cell(team.overall_points),
    ]
}

/// `pick` is the overall pick; the round slot is derived from it
fn pick_row(league_id: i64, year: i32, pick: &NffcPick) -> Vec<String> {
    let pick_in_round = pick.pick - (pick.round - 1) * TEAMS_PER_LEAGUE;
    vec![
        league_id.to_string(),
        year.to_string(),
        pick.round.to_string(),
        pick_in_round.to_string(),
        pick.pick.to_string(),
        pick.team.to_string(),
        pick.player.clone(),
        cell(pick.timestamp.as_deref()),
        cell(pick.pick_duration.as_deref()),
    ]
}

fn adp_row(year: i32, entry: &AdpEntry) -> Vec<String> {
    vec![
        entry.player.clone(),
        year.to_string(),
        entry.adp.to_string(),
        cell(entry.min_pick),
        cell(entry.max_pick),
        cell(entry.number),
    ]
}

/// nflreadr lookups used to enrich players
#[derive(Debug, Default)]
pub struct PlayerSources {
    /// `ff_playerids` by sportradar ID, which is the NFFC player UUID
    pub ids: HashMap<String, NflreadrRecord>,
    /// `players` by GSIS ID
    pub details: HashMap<String, NflreadrRecord>,
}

impl PlayerSources {
    pub fn load(dir: &NflreadrDir) -> Result<Self> {
        let ids = or_empty(dir.ff_playerids(), FF_PLAYERIDS_CSV)?;
        let details = or_empty(dir.players(), source_feeds::nflreadr::PLAYERS_CSV)?;
        Ok(Self {
            ids: NflreadrDir::index_by(ids, "sportradar_id"),
            details: NflreadrDir::index_by(details, "gsis_id"),
        })
    }

    /// One `players.csv` row; the bool says whether nflreadr knew the player
    pub fn player_row(&self, uuid: &str, adp: Option<&AdpPlayerInfo>) -> (Vec<String>, bool) {
        let empty = NflreadrRecord::default();
        let ids = self.ids.get(uuid).unwrap_or(&empty);
        let gsis = ids.get("gsis_id");
        let detail = self.details.get(gsis).filter(|_| !gsis.is_empty()).unwrap_or(&empty);
        let adp = adp.cloned().unwrap_or_default();

        let (first, last) = match ids.opt("name") {
            Some(name) => match name.split_once(' ') {
                Some((first, last)) => (first.to_string(), last.to_string()),
                None => (name.to_string(), String::new()),
            },
            None => (adp.fname.unwrap_or_default(), adp.lname.unwrap_or_default()),
        };
        let either = |primary: Option<&str>, fallback: &str| primary.unwrap_or(fallback).to_string();

        let row = vec![
            uuid.to_string(),
            first,
            last,
            either(ids.opt("position"), adp.pos.as_deref().unwrap_or_default()),
            either(ids.opt("birthdate"), adp.dob.as_deref().unwrap_or_default()),
            gsis.to_string(),
            ids.get("espn_id").to_string(),
            ids.get("yahoo_id").to_string(),
            ids.get("sleeper_id").to_string(),
            ids.get("pfr_id").to_string(),
            ids.get("rotowire_id").to_string(),
            detail.get("headshot").to_string(),
            either(ids.opt("college"), detail.get("college_name")),
            either(ids.opt("draft_year"), detail.get("draft_year")),
            either(ids.opt("draft_round"), detail.get("draft_round")),
            either(ids.opt("draft_ovr"), detail.get("draft_pick")),
            either(detail.opt("latest_team"), ids.get("team")),
            detail.get("status").to_string(),
        ];
        (row, !gsis.is_empty())
    }
}

pub fn build(layout: &DataLayout, years: RangeInclusive<i32>, sources: &PlayerSources) -> Result<CleanDataset> {
    let mut data = CleanDataset::default();
    let mut uuids: BTreeSet<String> = BTreeSet::new();
    let mut adp_info: HashMap<String, AdpPlayerInfo> = HashMap::new();

    for year in years {
        let leagues: Option<Vec<NffcLeague>> = read_json_if_exists(&layout.nffc_leagues_file(year))?;
        let details: Option<BTreeMap<String, LeagueDetail>> = read_json_if_exists(&layout.nffc_details_file(year))?;
        let (Some(leagues), Some(details)) = (leagues, details) else {
            warn!(year, "League list or details missing, run `nffc pull` first");
            data.skipped_seasons.push(year);
            continue;
        };

        let rotowire: HashSet<i64> = leagues.iter().filter(|l| l.is_rotowire_online()).map(|l| l.id).collect();
        let mut kept: HashSet<i64> = HashSet::new();
        for (key, detail) in &details {
            let Ok(league_id) = key.parse::<i64>() else { continue };
            if !rotowire.contains(&league_id) {
                continue;
            }
            kept.insert(league_id);
            data.leagues.push(league_row(league_id, year, detail));
            data.league_teams.extend(detail.teams.iter().map(|team| team_row(league_id, year, team)));
        }

        let drafts: BTreeMap<String, LeagueDraft> =
            read_json_if_exists(&layout.nffc_drafts_file(year))?.unwrap_or_default();
        for draft in drafts.values().filter(|d| kept.contains(&d.league_id)) {
            for raw in &draft.picks {
                match serde_json::from_value::<NffcPick>(raw.clone()) {
                    Ok(pick) => {
                        uuids.insert(pick.player.clone());
                        data.draft_picks.push(pick_row(draft.league_id, year, &pick));
                    }
                    Err(_) => data.bad_picks += 1,
                }
            }
        }

        match read_json_if_exists::<Vec<AdpEntry>>(&layout.nffc_adp_file(year))? {
            Some(entries) => {
                for entry in &entries {
                    uuids.insert(entry.player.clone());
                    adp_info.entry(entry.player.clone()).or_insert_with(|| entry.player_info.clone());
                    data.adp.push(adp_row(year, entry));
                }
            }
            None => warn!(year, "No ADP file"),
        }
        info!(year, leagues = kept.len(), "Season built");
    }

    for uuid in &uuids {
        let (row, matched) = sources.player_row(uuid, adp_info.get(uuid));
        if matched {
            data.matched += 1;
        } else {
            data.unmatched += 1;
        }
        data.players.push(row);
    }
    info!(
        "Players: {} total, {} matched to nflreadr, {} unmatched",
        data.players.len(),
        data.matched,
        data.unmatched
    );
    Ok(data)
}

/// Write one table unless it is empty; returns the file line for the report
fn write_table(layout: &DataLayout, file: &str, columns: &[&str], rows: &[Vec<String>]) -> Result<Option<String>> {
    if rows.is_empty() {
        warn!("No rows to write for {}", file);
        return Ok(None);
    }
    let path = layout.clean().join(file);
    write_csv(&path, columns, rows).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("{}: {} rows", file, rows.len());
    Ok(Some(format!("{}: {} rows", file, rows.len())))
}

pub async fn run(ctx: &IngestContext) -> Result<Summary> {
    let sources = PlayerSources::load(&NflreadrDir::new(ctx.layout.nflreadr()))?;
    let data = build(&ctx.layout, seasons(ctx), &sources)?;

    let tables: [(&str, &[&str], &[Vec<String>]); 5] = [
        (LEAGUES_CSV, &LEAGUE_COLUMNS, &data.leagues),
        (LEAGUE_TEAMS_CSV, &LEAGUE_TEAM_COLUMNS, &data.league_teams),
        (DRAFT_PICKS_CSV, &PICK_COLUMNS, &data.draft_picks),
        (ADP_CSV, &ADP_COLUMNS, &data.adp),
        (PLAYERS_CSV, &PLAYER_COLUMNS, &data.players),
    ];
    let mut written = Vec::new();
    for (file, columns, rows) in tables {
        written.extend(write_table(&ctx.layout, file, columns, rows)?);
    }

    let skipped = data.skipped_seasons.iter().map(|y| format!("{}: raw files missing", y)).collect();
    Ok(Summary::new("NFFC CLEAN DATASET")
        .row("Leagues", data.leagues.len())
        .row("League teams", data.league_teams.len())
        .row("Draft picks", data.draft_picks.len())
        .row("Unreadable picks", data.bad_picks)
        .row("ADP entries", data.adp.len())
        .row("Players", data.players.len())
        .row("Matched to nflreadr", data.matched)
        .row("Unmatched", data.unmatched)
        .section("Files written", written)
        .section("Skipped seasons", skipped))
}

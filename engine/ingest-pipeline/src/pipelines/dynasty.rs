//! Dan's dynasty trade values: `dan_id` bootstrap and value history

use crate::context::IngestContext;
use crate::players::{fetch_players, patch_players};
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use player_identity::{normalize_name, MatchQuery, NameFallback, PlayerIndex, Resolver};
use serde_json::json;
use source_feeds::imports::{
    parse_number, read_change_log, read_dan_values, read_dynasty_values, ChangeLogEntry, DanTradeValue,
    CHANGE_LOG_CSV, DAN_VALUES_CSV, DYNASTY_VALUES_CSV,
};
use std::collections::{BTreeSet, HashMap};
use supabase_rest::{row, upsert_grouped, Row, UpsertOptions};
use tracing::{info, warn};

pub const DYNASTY_VALUES_TABLE: &str = "dynasty_values";
pub const HISTORY_TABLE: &str = "dynasty_value_history";

#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedValue {
    pub name: String,
    pub position: String,
    pub dan_id: String,
    pub value: f64,
}

impl UnmatchedValue {
    fn line(&self) -> String {
        format!("{} ({}) [dan_id={}] Value={}", self.name, self.position, self.dan_id, self.value)
    }
}

#[derive(Debug, Default)]
pub struct DanMatch {
    /// `(player_id, dan_id)` for every matched row
    pub dan_ids: Vec<(String, String)>,
    pub values: Vec<Row>,
    /// Highest value first
    pub unmatched: Vec<UnmatchedValue>,
}

pub fn match_dan_values(index: &PlayerIndex, sheet: &[DanTradeValue]) -> DanMatch {
    let resolver = Resolver::new(index, NameFallback::Any);
    let mut out = DanMatch::default();

    for entry in sheet {
        if entry.dan_id.is_empty() || entry.player.is_empty() {
            continue;
        }
        let position = entry.position.to_uppercase();
        let value = parse_number(&entry.value);

        let Some(hit) = resolver.resolve(&MatchQuery::by_name(&entry.player).position(&position)) else {
            out.unmatched.push(UnmatchedValue {
                name: entry.player.clone(),
                position,
                dan_id: entry.dan_id.clone(),
                value: value.unwrap_or(0.0),
            });
            continue;
        };

        let player_id = hit.player.player_id.clone();
        out.dan_ids.push((player_id.clone(), entry.dan_id.clone()));
        if let Some(value) = value {
            let mut dv = row([("player_id", json!(player_id)), ("value", json!(value))]);
            if let Some(sf) = parse_number(&entry.sf_value) {
                dv.insert("sf_value".to_string(), json!(sf));
            }
            out.values.push(dv);
        }
    }

    out.unmatched.sort_by(|a, b| b.value.total_cmp(&a.value));
    out
}

/// `dynasty match-dan`
pub async fn run_match_dan(ctx: &IngestContext) -> Result<Summary> {
    let sheet = read_dan_values(&ctx.layout.imports())
        .with_context(|| format!("Failed to read {}; export the sheet first", DAN_VALUES_CSV))?;
    info!("Read {} rows from dynasty values CSV", sheet.len());

    let players = fetch_players(ctx.store(), &[]).await?;
    let index = PlayerIndex::build(players);
    let result = match_dan_values(&index, &sheet);
    info!("Matched {} rows, {} unmatched", result.dan_ids.len(), result.unmatched.len());

    let matched = result.dan_ids.len();
    let updates = result
        .dan_ids
        .into_iter()
        .map(|(player_id, dan_id)| (player_id, row([("dan_id", json!(dan_id))])));
    let outcome = patch_players(ctx.store(), updates).await;

    let values = upsert_grouped(
        ctx.store(),
        DYNASTY_VALUES_TABLE,
        result.values,
        UpsertOptions::batch(100).on_conflict(&["player_id"]),
    )
    .await
    .context("Failed to upsert dynasty values")?;

    let (high, zero): (Vec<_>, Vec<_>) = result.unmatched.iter().partition(|u| u.value >= 1.0);
    let high: Vec<String> = high.iter().map(|u| u.line()).collect();
    let zero: Vec<String> = zero.iter().map(|u| u.line()).collect();

    Ok(Summary::new("DAN ID MATCH")
        .row("CSV rows", sheet.len())
        .row("Matched", matched)
        .row("dan_id set", outcome.applied)
        .row("Values inserted", values.written)
        .row("Errors", outcome.failed.len() + values.failed)
        .row("Unmatched", result.unmatched.len())
        .section(&format!("UNMATCHED - Value >= 1 ({} players, NEEDS ATTENTION)", high.len()), high)
        .section(&format!("Unmatched - Value 0 ({} players, likely legacy)", zero.len()), truncated(zero, 20)))
}

/// `M/D/YYYY` as a date
pub fn parse_change_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%m/%d/%Y").ok()
}

/// Resolves change-log names: name -> dan_id -> player, then the name itself
pub struct HistoryResolver<'a> {
    name_to_dan: HashMap<String, String>,
    dan_to_player: HashMap<String, String>,
    index: &'a PlayerIndex,
}

impl<'a> HistoryResolver<'a> {
    pub fn new(
        name_to_dan: HashMap<String, String>,
        dan_to_player: HashMap<String, String>,
        index: &'a PlayerIndex,
    ) -> Self {
        Self { name_to_dan, dan_to_player, index }
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        let norm = normalize_name(name);
        self.name_to_dan
            .get(&norm)
            .and_then(|dan_id| self.dan_to_player.get(dan_id))
            .cloned()
            .or_else(|| self.index.by_name(&norm).map(|p| p.player_id.clone()))
    }
}

#[derive(Debug, Default)]
pub struct HistoryRows {
    pub rows: Vec<Row>,
    pub bad_dates: usize,
    pub unmatched: BTreeSet<String>,
}

pub fn history_rows(entries: &[ChangeLogEntry], resolver: &HistoryResolver) -> HistoryRows {
    let mut out = HistoryRows::default();
    for entry in entries {
        if entry.player.is_empty() || entry.date.is_empty() {
            continue;
        }
        let Some(date) = parse_change_date(&entry.date) else {
            warn!("Bad date '{}' for {}, skipping", entry.date, entry.player);
            out.bad_dates += 1;
            continue;
        };
        let Some(player_id) = resolver.resolve(&entry.player) else {
            out.unmatched.insert(entry.player.clone());
            continue;
        };

        let mut history = row([
            ("player_id", json!(player_id)),
            ("date", json!(date.format("%Y-%m-%d").to_string())),
        ]);
        if let Some(old) = parse_number(&entry.old) {
            history.insert("old_value".to_string(), json!(old));
        }
        if let Some(new) = parse_number(&entry.new) {
            history.insert("new_value".to_string(), json!(new));
        }
        if !entry.comment.is_empty() {
            history.insert("comment".to_string(), json!(entry.comment));
        }
        out.rows.push(history);
    }
    out
}

/// `dynasty history`
pub async fn run_history(ctx: &IngestContext) -> Result<Summary> {
    let imports = ctx.layout.imports();
    let entries = read_change_log(&imports).with_context(|| format!("Failed to read {}", CHANGE_LOG_CSV))?;

    let name_to_dan: HashMap<String, String> = match read_dynasty_values(&imports) {
        Ok(rows) => rows
            .into_iter()
            .filter(|r| !r.player.is_empty() && !r.dan_id.is_empty())
            .map(|r| (normalize_name(&r.player), r.dan_id))
            .collect(),
        Err(e) if e.is_not_found() => {
            warn!("{} not found, skipping dan_id mapping", DYNASTY_VALUES_CSV);
            HashMap::new()
        }
        Err(e) => return Err(e.into()),
    };
    info!("Loaded {} Player -> dan_id mappings", name_to_dan.len());

    let players = fetch_players(ctx.store(), &["dan_id"]).await?;
    let dan_to_player: HashMap<String, String> = players
        .iter()
        .filter_map(|p| p.column("dan_id").map(|dan_id| (dan_id, p.player_id.clone())))
        .collect();
    info!("Found {} players with dan_id in DB", dan_to_player.len());

    let index = PlayerIndex::build(players);
    let resolver = HistoryResolver::new(name_to_dan, dan_to_player, &index);
    let history = history_rows(&entries, &resolver);
    info!("Read {} change log rows, {} resolved", entries.len(), history.rows.len());

    let result = upsert_grouped(ctx.store(), HISTORY_TABLE, history.rows, UpsertOptions::batch(100))
        .await
        .context("Failed to upsert dynasty value history")?;

    let unmatched: Vec<String> = history.unmatched.into_iter().collect();
    Ok(Summary::new("DYNASTY VALUE HISTORY")
        .row("CSV rows", entries.len())
        .row("Inserted", result.written)
        .row("Errors", result.failed)
        .row("Bad dates", history.bad_dates)
        .row("No match", unmatched.len())
        .section(&format!("UNMATCHED PLAYERS ({} unique)", unmatched.len()), unmatched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, player, store_with_players, with, write_file};

    #[tokio::test]
    async fn test_match_dan_sets_ids_and_values() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("imports").join(DAN_VALUES_CSV),
            "dan_id,Player,Position,Value,SF_Value\n\
             101,Josh Allen,QB,95,99\n\
             102,Bijan Robinson,rb,88,\n\
             103,Retired Guy,WR,0,\n\
             104,Missing Star,WR,40,42\n\
             ,No Id,WR,10,\n\
             105,Legacy Pick,RB,,\n",
        );
        let store = store_with_players(vec![
            player("p-allen", "Josh", "Allen", "QB", "BUF"),
            player("p-bijan", "Bijan", "Robinson", "RB", "ATL"),
            player("p-legacy", "Legacy", "Pick", "RB", ""),
        ])
        .await;
        let ctx = context(dir.path(), store.clone());

        let summary = run_match_dan(&ctx).await.unwrap();
        assert_eq!(summary.count("Matched"), Some(3));
        assert_eq!(summary.count("dan_id set"), Some(3));
        assert_eq!(summary.count("Values inserted"), Some(2));
        assert_eq!(summary.count("Unmatched"), Some(2));
        assert_eq!(
            summary.section_lines("UNMATCHED - Value >= 1 (1 players, NEEDS ATTENTION)").unwrap(),
            ["Missing Star (WR) [dan_id=104] Value=40"]
        );

        let values = store.rows(DYNASTY_VALUES_TABLE).await;
        let allen = values.iter().find(|r| r["player_id"] == "p-allen").unwrap();
        assert_eq!(allen["sf_value"], 99.0);
        let bijan = values.iter().find(|r| r["player_id"] == "p-bijan").unwrap();
        assert!(!bijan.contains_key("sf_value"));

        let players = store.rows("players").await;
        let legacy = players.iter().find(|r| r["player_id"] == "p-legacy").unwrap();
        assert_eq!(legacy["dan_id"], "105");
    }

    #[test]
    fn test_parse_change_date() {
        assert_eq!(parse_change_date("3/7/2025"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(parse_change_date("12/31/2024"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_change_date("2025-03-07"), None);
    }

    #[tokio::test]
    async fn test_history_resolves_through_dan_id() {
        let dir = tempfile::tempdir().unwrap();
        let imports = dir.path().join("imports");
        write_file(
            &imports.join(CHANGE_LOG_CSV),
            "Player,Date,Old,New,Comment\n\
             Hollywood Brown,1/15/2025,20,25,Signed with KC\n\
             Josh Allen,2/1/2025,95,97,\n\
             Nobody Known,2/2/2025,1,2,\n\
             Josh Allen,not a date,1,2,\n",
        );
        write_file(&imports.join(DYNASTY_VALUES_CSV), "Player,dan_id\nHollywood Brown,77\n");
        let store = store_with_players(vec![
            with(player("p-brown", "Marquise", "Brown", "WR", "KC"), "dan_id", json!("77")),
            player("p-allen", "Josh", "Allen", "QB", "BUF"),
        ])
        .await;
        let ctx = context(dir.path(), store.clone());

        let summary = run_history(&ctx).await.unwrap();
        assert_eq!(summary.count("Inserted"), Some(2));
        assert_eq!(summary.count("Bad dates"), Some(1));
        assert_eq!(summary.section_lines("UNMATCHED PLAYERS (1 unique)").unwrap(), ["Nobody Known"]);

        let rows = store.rows(HISTORY_TABLE).await;
        let brown = rows.iter().find(|r| r["player_id"] == "p-brown").unwrap();
        assert_eq!(brown["date"], "2025-01-15");
        assert_eq!(brown["comment"], "Signed with KC");
        let allen = rows.iter().find(|r| r["player_id"] == "p-allen").unwrap();
        assert!(!allen.contains_key("comment"));
    }
}

//! `teams refresh`: sync `latest_team` from Sleeper
//!
//! A team is never cleared; players Sleeper lists without a team keep the
//! last one we saw. Every run appends a record to `logs/team_refresh.jsonl`.

use crate::context::IngestContext;
use crate::layout::append_jsonl;
use crate::players::{patch_players, PLAYERS_TABLE};
use crate::report::{truncated, Summary};
use anyhow::{Context, Result};
use player_identity::{is_skill_position, normalize_team, PlayerRow};
use serde::Serialize;
use serde_json::json;
use source_feeds::{SleeperClient, SleeperPlayers};
use std::collections::HashMap;
use supabase_rest::{row, select_as, Select};
use tracing::info;

pub const TEAM_REFRESH_LOG: &str = "team_refresh.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ChangeKind {
    /// Moved from one team to another
    #[serde(rename = "TRADE/FA")]
    Trade,
    /// Had no team before
    #[serde(rename = "SIGNED")]
    Signed,
}

impl ChangeKind {
    fn label(self) -> &'static str {
        match self {
            ChangeKind::Trade => "TRADE/FA",
            ChangeKind::Signed => "SIGNED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamChange {
    pub player_id: String,
    pub name: String,
    pub position: String,
    pub old_team: String,
    pub new_team: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
}

#[derive(Debug, Default)]
pub struct TeamDiff {
    pub same_team: usize,
    pub not_in_sleeper: usize,
    pub skipped_fa: usize,
    /// Trades first, then signings; by name within each
    pub changes: Vec<TeamChange>,
}

impl TeamDiff {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Sleeper ID -> normalized team for skill-position players
pub fn sleeper_teams(players: &SleeperPlayers) -> HashMap<&str, String> {
    players
        .iter()
        .filter(|(_, p)| is_skill_position(&p.position_code()))
        .map(|(id, p)| (id.as_str(), normalize_team(p.team.as_deref().unwrap_or_default())))
        .collect()
}

pub fn diff_teams(db_players: &[PlayerRow], teams: &HashMap<&str, String>) -> TeamDiff {
    let mut diff = TeamDiff::default();

    for player in db_players {
        let Some(sleeper_id) = player.column("sleeper_id") else {
            continue;
        };
        let Some(new_team) = teams.get(sleeper_id.as_str()) else {
            diff.not_in_sleeper += 1;
            continue;
        };
        let old_team = normalize_team(player.team());
        if old_team == *new_team {
            diff.same_team += 1;
            continue;
        }
        if new_team.is_empty() {
            diff.skipped_fa += 1;
            continue;
        }

        let kind = if old_team.is_empty() { ChangeKind::Signed } else { ChangeKind::Trade };
        diff.changes.push(TeamChange {
            player_id: player.player_id.clone(),
            name: player.full_name(),
            position: player.position_code(),
            old_team: if old_team.is_empty() { "(none)".to_string() } else { old_team },
            new_team: new_team.clone(),
            kind,
        });
    }

    diff.changes.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
    diff
}

#[derive(Serialize)]
struct RefreshLogEntry<'a> {
    timestamp: String,
    dry_run: bool,
    db_players: usize,
    same_team: usize,
    changes: usize,
    team_changes: usize,
    newly_signed: usize,
    skipped_fa: usize,
    details: &'a [TeamChange],
}

pub async fn run(ctx: &IngestContext, client: &SleeperClient, dry_run: bool) -> Result<Summary> {
    info!("Fetching Sleeper API...");
    let players = client.players().await.context("Failed to fetch Sleeper players")?;
    run_with(ctx, &players, dry_run).await
}

pub async fn run_with(ctx: &IngestContext, players: &SleeperPlayers, dry_run: bool) -> Result<Summary> {
    let teams = sleeper_teams(players);
    info!("{} skill-position players with team data", teams.len());

    let query = Select::table(PLAYERS_TABLE)
        .columns(&["player_id", "first_name", "last_name", "position", "latest_team", "sleeper_id"])
        .not_null("sleeper_id");
    let db_players: Vec<PlayerRow> = select_as(ctx.store(), &query)
        .await
        .context("Failed to fetch players with sleeper_id")?;
    info!("{} players with sleeper_id in DB", db_players.len());

    let diff = diff_teams(&db_players, &teams);
    let listing = diff
        .changes
        .iter()
        .map(|c| {
            format!(
                "{:10} {:30} {:3}  {:4} -> {:4}",
                c.kind.label(),
                c.name,
                c.position,
                c.old_team,
                c.new_team
            )
        })
        .collect();

    let mut summary = Summary::new("TEAM UPDATE SUMMARY")
        .row("Same team (no change)", diff.same_team)
        .row("Not in Sleeper data", diff.not_in_sleeper)
        .row("Skipped (now FA/retired)", diff.skipped_fa)
        .row("Team changes", diff.count(ChangeKind::Trade))
        .row("Newly signed", diff.count(ChangeKind::Signed))
        .row("Total to update", diff.changes.len())
        .section("Changes", listing);

    if dry_run {
        summary.push_row("Dry run", format!("{} changes would be applied", diff.changes.len()));
    } else if !diff.changes.is_empty() {
        let updates = diff
            .changes
            .iter()
            .map(|c| (c.player_id.clone(), row([("latest_team", json!(c.new_team))])));
        let outcome = patch_players(ctx.store(), updates).await;
        let errors = outcome.failed.iter().map(|(pid, e)| format!("{pid}: {e}")).collect();
        summary.push_row("Applied", outcome.applied);
        summary.push_row("Errors", outcome.failed.len());
        summary.push_section("Errors", truncated(errors, 10));
    }

    let log_path = ctx.layout.logs().join(TEAM_REFRESH_LOG);
    append_jsonl(
        &log_path,
        &RefreshLogEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            dry_run,
            db_players: db_players.len(),
            same_team: diff.same_team,
            changes: diff.changes.len(),
            team_changes: diff.count(ChangeKind::Trade),
            newly_signed: diff.count(ChangeKind::Signed),
            skipped_fa: diff.skipped_fa,
            details: &diff.changes,
        },
    )?;
    summary.push_row("Logged to", log_path.display());
    Ok(summary)
}

//! NFFC draft history: pull raw API data, build clean CSVs, load them
//!
//! Only Rotowire Online Championship leagues make it into the clean set;
//! those are all 12-team drafts.

pub mod build;
pub mod load;
pub mod pull;

use crate::context::IngestContext;
use std::ops::RangeInclusive;

/// Teams in every Rotowire Online Championship league
pub const TEAMS_PER_LEAGUE: i64 = 12;

/// Seasons covered by a pull or build
pub fn seasons(ctx: &IngestContext) -> RangeInclusive<i32> {
    ctx.config.data.nffc_first_season..=ctx.config.data.nffc_current_season
}

pub const LEAGUES_CSV: &str = "leagues.csv";
pub const LEAGUE_TEAMS_CSV: &str = "league_teams.csv";
pub const DRAFT_PICKS_CSV: &str = "draft_picks.csv";
pub const ADP_CSV: &str = "adp.csv";
pub const PLAYERS_CSV: &str = "players.csv";

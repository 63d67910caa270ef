//! `match <source>`: resolve one vendor's players and save their IDs
//!
//! Each source writes `data/matched/<source>_ids.json`; nothing touches the
//! database until `ids apply`.

pub mod adp_sources;
pub mod fbg;
pub mod nflreadr;
pub mod sleeper;
pub mod sportsdata;

use crate::report::Summary;
use player_identity::{suggest, MatchedIds, PlayerIndex};
use serde::Serialize;
use std::cmp::Ordering;

/// ADP given to rows with a missing or unreadable ADP
pub const UNKNOWN_ADP: f64 = 999.0;

/// A vendor row that found no player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unmatched {
    pub name: String,
    pub pos: String,
    pub team: String,
    pub adp: f64,
    pub source_id: String,
}

/// One `column: count` row per ID column
pub(crate) fn push_coverage(summary: &mut Summary, matched: &MatchedIds, columns: &[&str]) {
    for column in columns {
        summary.push_row(column, matched.column_count(column));
    }
}

/// Unmatched rows under `below` ADP, best first, with a fuzzy suggestion
pub(crate) fn adp_listing(
    index: &PlayerIndex,
    unmatched: &[Unmatched],
    below: f64,
    limit: usize,
    id_label: &str,
) -> Vec<String> {
    let mut top: Vec<&Unmatched> = unmatched.iter().filter(|u| u.adp < below).collect();
    top.sort_by(|a, b| a.adp.partial_cmp(&b.adp).unwrap_or(Ordering::Equal));

    top.into_iter()
        .take(limit)
        .map(|u| {
            let mut line = format!(
                "ADP {:>6.1}: {} ({}, {}) {}: {}",
                u.adp, u.name, u.pos, u.team, id_label, u.source_id
            );
            if let Some(s) = suggest(index, &u.name, &u.pos) {
                line.push_str(&format!("  -> did you mean {} ({})?", s.name, s.player_id));
            }
            line
        })
        .collect()
}

use crate::index::PlayerIndex;
use crate::normalize::{normalize_name, normalize_position};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Minimum skim score for a suggestion
const SUGGESTION_THRESHOLD: i64 = 60;

/// Closest DB player for an unmatched record
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub player_id: String,
    pub name: String,
    pub score: i64,
}

/// Find the best fuzzy candidate of the same position
///
/// Only used for reports; suggestions are never applied automatically.
pub fn suggest(index: &PlayerIndex, name: &str, position: &str) -> Option<Suggestion> {
    let target = normalize_name(name);
    let position = normalize_position(position);
    if target.is_empty() {
        return None;
    }

    let matcher = SkimMatcherV2::default();
    let mut best: Option<Suggestion> = None;

    for player in index.players() {
        if player.position_code() != position {
            continue;
        }
        let candidate = player.normalized_name();
        let Some(score) = matcher.fuzzy_match(&candidate, &target) else {
            continue;
        };
        if score > SUGGESTION_THRESHOLD && best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Suggestion {
                player_id: player.player_id.clone(),
                name: player.full_name(),
                score,
            });
        }
    }

    best
}

//! Normalization rules shared by every loader
//!
//! Vendors disagree on punctuation, suffixes and team codes ("D.J. Moore",
//! "DJ Moore"; "JAC", "JAX"). Everything is folded into one canonical form
//! before it is used as a lookup key.

use crate::aliases::TEAM_FULL_NAMES;
use regex::Regex;
use std::sync::OnceLock;

/// Positions that are matched and loaded; team defenses are skipped
pub const SKILL_POSITIONS: &[&str] = &["QB", "RB", "WR", "TE", "K"];

static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();
static HEIGHT_RE: OnceLock<Regex> = OnceLock::new();

fn suffix_re() -> &'static Regex {
    SUFFIX_RE.get_or_init(|| {
        Regex::new(r"\s+(jr\.?|sr\.?|ii|iii|iv|v)$").expect("suffix pattern is valid")
    })
}

fn height_re() -> &'static Regex {
    HEIGHT_RE.get_or_init(|| Regex::new(r"^(\d+)'(\d+)").expect("height pattern is valid"))
}

/// Normalize a player name for matching
///
/// Lowercases, strips one generational suffix (Jr., Sr., II-V), drops
/// periods and quotes (hyphens are kept) and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    let without_suffix = suffix_re().replace(&lowered, "");
    let without_punct: String =
        without_suffix.chars().filter(|c| !matches!(c, '.' | '"' | '\'')).collect();

    without_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a team abbreviation; free agents map to the empty string
pub fn normalize_team(team: &str) -> String {
    let upper = team.trim().to_uppercase();
    match upper.as_str() {
        "LA" => "LAR".to_string(),
        "JAC" => "JAX".to_string(),
        "WSH" => "WAS".to_string(),
        "OAK" => "LV".to_string(),
        "FA" => String::new(),
        _ => upper,
    }
}

/// Map a full franchise name ("Kansas City Chiefs") to its abbreviation
pub fn team_abbr_from_full_name(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_lowercase();
    TEAM_FULL_NAMES.iter().find(|(full, _)| *full == lowered).map(|(_, abbr)| *abbr)
}

pub fn normalize_position(position: &str) -> String {
    position.trim().to_uppercase()
}

/// Footballguys position codes -> our positions. Fullbacks count as RB.
pub fn fbg_position(position: &str) -> Option<&'static str> {
    match position.trim().to_lowercase().as_str() {
        "qb" => Some("QB"),
        "rb" | "fb" => Some("RB"),
        "wr" => Some("WR"),
        "te" => Some("TE"),
        "pk" => Some("K"),
        _ => None,
    }
}

pub fn is_skill_position(position: &str) -> bool {
    let upper = normalize_position(position);
    SKILL_POSITIONS.contains(&upper.as_str())
}

/// Convert a SportsData height (`6'0"`) to the DB format (`6-0`)
pub fn convert_height(height: &str) -> Option<String> {
    let caps = height_re().captures(height.trim())?;
    Some(format!("{}-{}", &caps[1], &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_strips_suffix_and_punctuation() {
        assert_eq!(normalize_name("Odell Beckham Jr."), "odell beckham");
        assert_eq!(normalize_name("Marvin Harrison Jr"), "marvin harrison");
        assert_eq!(normalize_name("Michael Pittman III"), "michael pittman");
        assert_eq!(normalize_name("A.J. Brown"), "aj brown");
        assert_eq!(normalize_name("Ja'Marr Chase"), "jamarr chase");
        assert_eq!(normalize_name("  Amon-Ra  St. Brown "), "amon-ra st brown");
    }

    #[test]
    fn test_normalize_name_only_strips_trailing_suffix() {
        // "V" inside a name is not a suffix
        assert_eq!(normalize_name("Von Miller"), "von miller");
        assert_eq!(normalize_name("Kenneth Walker III"), "kenneth walker");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_normalize_team() {
        assert_eq!(normalize_team("la"), "LAR");
        assert_eq!(normalize_team("JAC"), "JAX");
        assert_eq!(normalize_team("WSH"), "WAS");
        assert_eq!(normalize_team("OAK"), "LV");
        assert_eq!(normalize_team("FA"), "");
        assert_eq!(normalize_team(" kc "), "KC");
        assert_eq!(normalize_team(""), "");
    }

    #[test]
    fn test_team_full_name() {
        assert_eq!(team_abbr_from_full_name("San Francisco 49ers"), Some("SF"));
        assert_eq!(team_abbr_from_full_name("washington commanders"), Some("WAS"));
        assert_eq!(team_abbr_from_full_name("Free Agent"), None);
    }

    #[test]
    fn test_positions() {
        assert_eq!(fbg_position("pk"), Some("K"));
        assert_eq!(fbg_position("FB"), Some("RB"));
        assert_eq!(fbg_position("dt"), None);
        assert!(is_skill_position("te"));
        assert!(!is_skill_position("DEF"));
    }

    #[test]
    fn test_convert_height() {
        assert_eq!(convert_height("6'0\""), Some("6-0".to_string()));
        assert_eq!(convert_height("5'11\""), Some("5-11".to_string()));
        assert_eq!(convert_height("tall"), None);
    }
}

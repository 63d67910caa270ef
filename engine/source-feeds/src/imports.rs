//! Hand-exported CSVs dropped into `data/imports/`

use crate::csv_files::read_csv;
use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

pub const UNDERDOG_ADP_CSV: &str = "underdog_ADP.csv";
pub const DRAFTKINGS_CSV: &str = "DkPreDraftRankings.csv";
pub const DRAFTERS_CSV: &str = "drafters_players.csv";
pub const DAN_VALUES_CSV: &str = "dan_tradevalues_with_rookies.csv";
pub const DYNASTY_VALUES_CSV: &str = "dynasty_values.csv";
pub const CHANGE_LOG_CSV: &str = "Change Log DTVC - Sheet1.csv";
pub const FBG_CROSSWALK_CSV: &str = "fbg_crosswalk.csv";

/// Parse a numeric cell, treating blanks and junk as absent
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse().ok()
}

/// Parse an integer cell that may be written as a float (`2018.0`)
///
/// The fraction is truncated. NaN, infinities and values outside `i64` are absent.
pub fn parse_whole_number(cell: &str) -> Option<i64> {
    let n = parse_number(cell)?.trunc();
    (n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64).then_some(n as i64)
}

/// DraftKings pre-draft rankings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftKingsRanking {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Position", default)]
    pub position: String,
    #[serde(rename = "Team", default)]
    pub team: String,
    #[serde(rename = "ADP", default)]
    pub adp: String,
}

/// Drafters player export; IDs come wrapped in quotes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftersPlayer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(rename = "team abbr", default)]
    pub team: String,
    #[serde(rename = "ADP", default)]
    pub adp: String,
}

impl DraftersPlayer {
    pub fn clean_id(&self) -> &str {
        self.id.trim_matches('"').trim()
    }
}

/// Dan's trade value sheet
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DanTradeValue {
    #[serde(default)]
    pub dan_id: String,
    #[serde(rename = "Player", default)]
    pub player: String,
    #[serde(rename = "Position", default)]
    pub position: String,
    #[serde(rename = "Value", default)]
    pub value: String,
    #[serde(rename = "SF_Value", default)]
    pub sf_value: String,
}

/// `dynasty_values.csv`: the name to dan_id bridge for the change log
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DynastyValueRow {
    #[serde(rename = "Player", default)]
    pub player: String,
    #[serde(default)]
    pub dan_id: String,
}

/// One line of the dynasty value change log
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChangeLogEntry {
    #[serde(rename = "Player", default)]
    pub player: String,
    /// `M/D/YYYY`
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Old", default)]
    pub old: String,
    #[serde(rename = "New", default)]
    pub new: String,
    #[serde(rename = "Comment", default)]
    pub comment: String,
}

/// FBG to SportsData crosswalk
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FbgCrosswalkRow {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "SportsDataIO ID", default)]
    pub sportsdata_id: String,
    #[serde(rename = "Position", default)]
    pub position: String,
}

impl FbgCrosswalkRow {
    /// SportsData ID, `-` meaning none
    pub fn sportsdata(&self) -> Option<&str> {
        Some(self.sportsdata_id.as_str()).filter(|id| !id.is_empty() && *id != "-")
    }
}

pub fn read_draftkings(dir: &Path) -> Result<Vec<DraftKingsRanking>> {
    read_csv(&dir.join(DRAFTKINGS_CSV))
}

pub fn read_drafters(dir: &Path) -> Result<Vec<DraftersPlayer>> {
    read_csv(&dir.join(DRAFTERS_CSV))
}

pub fn read_dan_values(dir: &Path) -> Result<Vec<DanTradeValue>> {
    read_csv(&dir.join(DAN_VALUES_CSV))
}

pub fn read_dynasty_values(dir: &Path) -> Result<Vec<DynastyValueRow>> {
    read_csv(&dir.join(DYNASTY_VALUES_CSV))
}

pub fn read_change_log(dir: &Path) -> Result<Vec<ChangeLogEntry>> {
    read_csv(&dir.join(CHANGE_LOG_CSV))
}

pub fn read_fbg_crosswalk(dir: &Path) -> Result<Vec<FbgCrosswalkRow>> {
    read_csv(&dir.join(FBG_CROSSWALK_CSV))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_whole_numbers() {
        assert_eq!(parse_whole_number("2018.0"), Some(2018));
        assert_eq!(parse_whole_number(" 7.9 "), Some(7));
        assert_eq!(parse_whole_number("-3.5"), Some(-3));
        assert_eq!(parse_whole_number("nan"), None);
        assert_eq!(parse_whole_number("inf"), None);
        assert_eq!(parse_whole_number("1e300"), None);
        assert_eq!(parse_whole_number(""), None);
    }

    #[test]
    fn test_drafters_ids_are_unquoted() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            DRAFTERS_CSV,
            "id,name,position,team abbr,ADP\n\"\"\"d-77\"\"\",Bijan Robinson,RB,ATL,2.1\n",
        );
        let rows = read_drafters(dir.path()).unwrap();
        assert_eq!(rows[0].id, "\"d-77\"");
        assert_eq!(rows[0].clean_id(), "d-77");
        assert_eq!(rows[0].team, "ATL");
    }

    #[test]
    fn test_crosswalk_dash_means_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            FBG_CROSSWALK_CSV,
            "ID,Name,SportsDataIO ID,Position\nAlleJo02,Josh Allen,19801,QB\nNewRo01,New Rookie,-,WR\n",
        );
        let rows = read_fbg_crosswalk(dir.path()).unwrap();
        assert_eq!(rows[0].sportsdata(), Some("19801"));
        assert_eq!(rows[1].sportsdata(), None);
    }

    #[test]
    fn test_change_log_with_missing_comment_column() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CHANGE_LOG_CSV, "Player,Date,Old,New\nBijan Robinson,3/14/2025,88,91\n");
        let rows = read_change_log(dir.path()).unwrap();
        assert_eq!(rows[0].date, "3/14/2025");
        assert_eq!(rows[0].comment, "");
        assert_eq!(parse_number(&rows[0].new), Some(91.0));
    }
}

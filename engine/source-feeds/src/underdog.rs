//! Underdog rankings export

use crate::csv_files::{parse_csv, read_csv};
use crate::error::Result;
use crate::http::{build_client, get_text};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One row of the rankings CSV (download or the saved `underdog_ADP.csv`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderdogRanking {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub adp: String,
    #[serde(default)]
    pub projected_points: String,
    #[serde(default)]
    pub position_rank: String,
    /// Roster slot (`QB`, `RB`, `WR`, `TE`, `K` or `FLEX`)
    #[serde(default)]
    pub slot_name: String,
    /// Full team name, e.g. `Kansas City Chiefs`
    #[serde(default)]
    pub team_name: String,
}

impl UnderdogRanking {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// ADP, absent when blank or `-`
    pub fn adp_value(&self) -> Option<f64> {
        match self.adp.as_str() {
            "" | "-" => None,
            adp => adp.parse().ok(),
        }
    }

    /// Projected points, absent when blank or `0.0`
    pub fn projected_points_value(&self) -> Option<f64> {
        match self.projected_points.as_str() {
            "" | "0.0" => None,
            points => points.parse().ok(),
        }
    }

    pub fn position_rank_value(&self) -> Option<&str> {
        Some(self.position_rank.as_str()).filter(|r| !r.is_empty())
    }

    /// Position implied by the slot; `FLEX` carries none
    pub fn slot_position(&self) -> Option<&str> {
        match self.slot_name.to_uppercase().as_str() {
            "" | "FLEX" => None,
            _ => Some(self.slot_name.as_str()),
        }
    }
}

/// Read a saved rankings CSV
pub fn read_rankings(path: &Path) -> Result<Vec<UnderdogRanking>> {
    read_csv(path)
}

/// Downloads the rankings CSV from a share link
pub struct UnderdogClient {
    client: Client,
    url: String,
}

impl UnderdogClient {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client("Mozilla/5.0", Duration::from_secs(60))?,
            url: url.to_string(),
        })
    }

    pub async fn rankings(&self) -> Result<Vec<UnderdogRanking>> {
        info!("Fetching Underdog ADP CSV...");
        let text = get_text(self.client.get(&self.url), "Underdog rankings download").await?;
        let rows = parse_csv(&text)?;
        info!("{} rows downloaded", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,firstName,lastName,adp,projectedPoints,positionRank,slotName,teamName
ud-1,Ja'Marr,Chase,1.2,310.5,WR1,WR,Cincinnati Bengals
ud-2,Travis,Hunter,-,0.0,,FLEX,Jacksonville Jaguars
ud-3,No,Adp,,,,RB,
";

    #[test]
    fn test_parse_rankings() {
        let rows: Vec<UnderdogRanking> = parse_csv(CSV).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].full_name(), "Ja'Marr Chase");
        assert_eq!(rows[0].adp_value(), Some(1.2));
        assert_eq!(rows[0].projected_points_value(), Some(310.5));
        assert_eq!(rows[0].position_rank_value(), Some("WR1"));
        assert_eq!(rows[0].slot_position(), Some("WR"));

        assert_eq!(rows[1].adp_value(), None);
        assert_eq!(rows[1].projected_points_value(), None);
        assert_eq!(rows[1].slot_position(), None);
        assert_eq!(rows[2].adp_value(), None);
    }
}

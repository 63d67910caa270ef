//! One module per CLI command group

pub mod adp;
pub mod dynasty;
pub mod enrich;
pub mod headshots;
pub mod ids;
pub mod match_ids;
pub mod missing_players;
pub mod nffc;
pub mod notes;
pub mod projections;
pub mod stats;
pub mod teams;
pub mod teams_refresh;

use anyhow::Result;
use tracing::warn;

/// Optional local inputs: a missing file is an empty list, a broken one an error
pub(crate) fn or_empty<T>(result: source_feeds::Result<Vec<T>>, what: &str) -> Result<Vec<T>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(e) if e.is_not_found() => {
            warn!("{} not found, skipping", what);
            Ok(Vec::new())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to read {what}"))),
    }
}

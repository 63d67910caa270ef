//! The storage seam every pipeline writes through

use crate::batch::{Row, UpsertOptions, UpsertSummary};
use crate::error::Result;
use crate::query::Select;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Abstract trait over a PostgREST-shaped table store
#[async_trait::async_trait]
pub trait RestStore: Send + Sync {
    /// Read every row matching `query`, following pagination
    async fn select_all(&self, query: &Select) -> Result<Vec<Row>>;

    /// Bulk upsert; failed batches are reported in the summary, not as errors
    async fn upsert(&self, table: &str, rows: Vec<Row>, options: UpsertOptions)
        -> Result<UpsertSummary>;

    /// Update rows where `match_col = match_val`
    async fn patch(&self, table: &str, match_col: &str, match_val: &str, updates: &Row)
        -> Result<()>;

    /// Exact row count of a table
    async fn count(&self, table: &str) -> Result<u64>;
}

/// Read rows and deserialize them into `T`
pub async fn select_as<T: DeserializeOwned>(store: &dyn RestStore, query: &Select) -> Result<Vec<T>> {
    let rows = store.select_all(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(Into::into))
        .collect()
}

/// Upsert rows grouped by their key set
///
/// Rows with different columns go out in separate requests so padding never
/// writes null over a column a row did not mention.
pub async fn upsert_grouped(
    store: &dyn RestStore,
    table: &str,
    rows: Vec<Row>,
    options: UpsertOptions,
) -> Result<UpsertSummary> {
    let mut groups: BTreeMap<Vec<String>, Vec<Row>> = BTreeMap::new();
    for row in rows {
        let mut signature: Vec<String> = row.keys().cloned().collect();
        signature.sort();
        groups.entry(signature).or_default().push(row);
    }

    let mut summary = UpsertSummary::default();
    for (_, group) in groups {
        summary.absorb(store.upsert(table, group, options.clone()).await?);
    }
    Ok(summary)
}

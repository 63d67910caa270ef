//! Helpers for bulk writes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One JSON object destined for a table
pub type Row = Map<String, Value>;

/// Options for a bulk upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Rows per POST
    pub batch_size: usize,

    /// Send `resolution=merge-duplicates` so existing rows are updated
    pub merge_duplicates: bool,

    /// Conflict target when it is not the primary key
    pub on_conflict: Option<String>,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self { batch_size: 500, merge_duplicates: true, on_conflict: None }
    }
}

impl UpsertOptions {
    pub fn batch(batch_size: usize) -> Self {
        Self { batch_size, ..Self::default() }
    }

    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.on_conflict = Some(columns.join(","));
        self
    }

    /// Value of the `Prefer` header
    pub fn prefer_header(&self) -> &'static str {
        if self.merge_duplicates {
            "return=minimal,resolution=merge-duplicates"
        } else {
            "return=minimal"
        }
    }
}

/// A failed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Index of the first row of the batch
    pub offset: usize,
    pub rows: usize,
    pub status: Option<u16>,
    pub message: String,
}

/// Outcome of a bulk upsert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub written: usize,
    pub failed: usize,
    pub errors: Vec<BatchError>,
}

impl UpsertSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    pub fn absorb(&mut self, other: UpsertSummary) {
        self.written += other.written;
        self.failed += other.failed;
        self.errors.extend(other.errors);
    }
}

/// Give every row the same keys: the sorted union of all keys
///
/// PostgREST rejects bulk inserts whose objects have different key sets.
/// Missing keys are filled with null.
pub fn pad_rows(rows: Vec<Row>) -> Vec<Row> {
    let keys: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
    rows.into_iter()
        .map(|mut row| {
            keys.iter()
                .map(|k| (k.clone(), row.remove(k).unwrap_or(Value::Null)))
                .collect::<Row>()
        })
        .collect()
}

/// Total from a `content-range` header such as `0-0/1234`
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

/// Build a row from `(column, value)` pairs
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

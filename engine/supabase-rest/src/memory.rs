//! In-memory `RestStore` and `ObjectStorage`
//!
//! Used by tests and by dry runs. Upserts honour per-table conflict keys,
//! selects understand `eq.`, `is.null` and `not.is.null` filters, and
//! embedded resources such as `players(first_name)` are joined on
//! `player_id`.

use crate::batch::{pad_rows, BatchError, Row, UpsertOptions, UpsertSummary};
use crate::error::Result;
use crate::query::Select;
use crate::storage::{public_object_url, BucketSpec, ObjectStorage};
use crate::store::RestStore;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

/// A recorded PATCH
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecord {
    pub table: String,
    pub match_col: String,
    pub match_val: String,
    pub updates: Row,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    patches: Vec<PatchRecord>,
    upsert_calls: Vec<(String, usize)>,
}

/// Table store backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    conflict_keys: HashMap<String, Vec<String>>,
    failing_tables: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of `table` sharing these columns are merged instead of appended
    pub fn with_conflict_keys(mut self, table: &str, columns: &[&str]) -> Self {
        self.conflict_keys
            .insert(table.to_string(), columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Every upsert batch for `table` fails with a 500
    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Seed a table without going through upsert
    pub async fn insert_rows(&self, table: &str, rows: Vec<Row>) {
        let mut state = self.state.lock().await;
        state.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.state.lock().await.tables.get(table).cloned().unwrap_or_default()
    }

    pub async fn patches(&self) -> Vec<PatchRecord> {
        self.state.lock().await.patches.clone()
    }

    /// `(table, batch size)` for every POST that would have been sent
    pub async fn upsert_calls(&self) -> Vec<(String, usize)> {
        self.state.lock().await.upsert_calls.clone()
    }

    fn conflict_columns(&self, table: &str, options: &UpsertOptions) -> Option<Vec<String>> {
        if let Some(on_conflict) = &options.on_conflict {
            return Some(on_conflict.split(',').map(|c| c.trim().to_string()).collect());
        }
        self.conflict_keys.get(table).cloned()
    }
}

fn cell(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Row, column: &str, expr: &str) -> bool {
    match expr {
        "not.is.null" => cell(row, column).is_some(),
        "is.null" => cell(row, column).is_none(),
        _ => match expr.strip_prefix("eq.") {
            Some(expected) => cell(row, column).as_deref() == Some(expected),
            None => true,
        },
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // nulls sort last in ascending order
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Split `players(first_name,last_name)` into table and columns
fn parse_embed(column: &str) -> Option<(&str, Vec<&str>)> {
    let open = column.find('(')?;
    let inner = column[open + 1..].strip_suffix(')')?;
    Some((&column[..open], inner.split(',').map(str::trim).collect()))
}

fn project(row: &Row, columns: &[String], tables: &HashMap<String, Vec<Row>>) -> Row {
    if columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut out = Row::new();
    for column in columns {
        if let Some((embed_table, embed_cols)) = parse_embed(column) {
            let joined = cell(row, "player_id").and_then(|pid| {
                tables
                    .get(embed_table)?
                    .iter()
                    .find(|r| cell(r, "player_id").as_deref() == Some(pid.as_str()))
            });
            let value = match joined {
                Some(other) => Value::Object(
                    embed_cols
                        .iter()
                        .map(|c| (c.to_string(), other.get(*c).cloned().unwrap_or(Value::Null)))
                        .collect(),
                ),
                None => Value::Null,
            };
            out.insert(embed_table.to_string(), value);
        } else if let Some(value) = row.get(column) {
            out.insert(column.clone(), value.clone());
        }
    }
    out
}

#[async_trait::async_trait]
impl RestStore for MemoryStore {
    async fn select_all(&self, query: &Select) -> Result<Vec<Row>> {
        let state = self.state.lock().await;
        let Some(rows) = state.tables.get(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<&Row> = rows
            .iter()
            .filter(|row| query.filters().iter().all(|(col, expr)| matches_filter(row, col, expr)))
            .collect();

        if let Some(order) = query.order_by() {
            let (column, direction) = order.split_once('.').unwrap_or((order, "asc"));
            selected.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                if direction.starts_with("desc") {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let columns = query.selected_columns();
        Ok(selected.into_iter().map(|row| project(row, &columns, &state.tables)).collect())
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        options: UpsertOptions,
    ) -> Result<UpsertSummary> {
        let padded = pad_rows(rows);
        let batch_size = options.batch_size.max(1);
        let conflict = self.conflict_columns(table, &options);
        let failing = self.failing_tables.contains(table);

        let mut state = self.state.lock().await;
        let mut summary = UpsertSummary::default();

        for (i, batch) in padded.chunks(batch_size).enumerate() {
            state.upsert_calls.push((table.to_string(), batch.len()));
            if failing {
                summary.failed += batch.len();
                summary.errors.push(BatchError {
                    offset: i * batch_size,
                    rows: batch.len(),
                    status: Some(500),
                    message: "simulated failure".to_string(),
                });
                continue;
            }

            let existing = state.tables.entry(table.to_string()).or_default();
            for row in batch {
                let key: Option<BTreeMap<&String, Option<String>>> = conflict
                    .as_ref()
                    .map(|cols| cols.iter().map(|c| (c, cell(row, c))).collect());

                let position = key.as_ref().and_then(|key| {
                    existing.iter().position(|r| key.iter().all(|(c, v)| cell(r, c) == *v))
                });

                match position {
                    Some(pos) if options.merge_duplicates => {
                        for (k, v) in row {
                            existing[pos].insert(k.clone(), v.clone());
                        }
                    }
                    Some(_) => {
                        summary.failed += 1;
                        summary.errors.push(BatchError {
                            offset: i * batch_size,
                            rows: 1,
                            status: Some(409),
                            message: "duplicate key".to_string(),
                        });
                        continue;
                    }
                    None => existing.push(row.clone()),
                }
                summary.written += 1;
            }
        }

        Ok(summary)
    }

    async fn patch(&self, table: &str, match_col: &str, match_val: &str, updates: &Row) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| cell(r, match_col).as_deref() == Some(match_val)) {
                for (k, v) in updates {
                    row.insert(k.clone(), v.clone());
                }
            }
        }
        state.patches.push(PatchRecord {
            table: table.to_string(),
            match_col: match_col.to_string(),
            match_val: match_val.to_string(),
            updates: updates.clone(),
        });
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<u64> {
        Ok(self.state.lock().await.tables.get(table).map_or(0, |rows| rows.len() as u64))
    }
}

/// In-memory object storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    base_url: String,
    buckets: Mutex<HashSet<String>>,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.to_string(), ..Self::default() }
    }

    pub async fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(&(bucket.to_string(), path.to_string())).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().await.contains(bucket)
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MemoryStorage {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<()> {
        self.buckets.lock().await.insert(spec.id.clone());
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.objects.lock().await.insert((bucket.to_string(), path.to_string()), bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(&self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::row;
    use serde_json::json;

    fn adp(player_id: &str, source: &str, adp: f64) -> Row {
        row([
            ("player_id", json!(player_id)),
            ("source", json!(source)),
            ("year", json!(2026)),
            ("adp", json!(adp)),
        ])
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict_keys() {
        let store = MemoryStore::new().with_conflict_keys("adp_sources", &["player_id", "source", "year"]);

        let summary = store
            .upsert("adp_sources", vec![adp("a", "underdog", 10.0), adp("b", "underdog", 20.0)], UpsertOptions::batch(1))
            .await
            .unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(store.upsert_calls().await.len(), 2);

        store
            .upsert("adp_sources", vec![adp("a", "underdog", 5.0), adp("a", "nffc", 7.0)], UpsertOptions::default())
            .await
            .unwrap();

        let rows = store.rows("adp_sources").await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["adp"], json!(5.0));
        assert_eq!(store.count("adp_sources").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_without_merge_fails_row() {
        let store = MemoryStore::new().with_conflict_keys("teams", &["team_abbr"]);
        let options = UpsertOptions { merge_duplicates: false, ..UpsertOptions::default() };
        let teams = vec![row([("team_abbr", json!("KC"))]), row([("team_abbr", json!("KC"))])];

        let summary = store.upsert("teams", teams, options).await.unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].status, Some(409));
    }

    #[tokio::test]
    async fn test_failing_table_reports_batches() {
        let store = MemoryStore::new().with_failing_table("player_stats");
        let rows = (0..5).map(|i| row([("id", json!(i))])).collect();
        let summary = store.upsert("player_stats", rows, UpsertOptions::batch(2)).await.unwrap();
        assert_eq!(summary.failed, 5);
        assert_eq!(summary.errors.len(), 3);
        assert_eq!(summary.errors[2].offset, 4);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_select_filters_order_and_embeds() {
        let store = MemoryStore::new();
        store
            .insert_rows(
                "players",
                vec![
                    row([("player_id", json!("a")), ("first_name", json!("Ann")), ("sleeper_id", json!("1"))]),
                    row([("player_id", json!("b")), ("first_name", json!("Bo")), ("sleeper_id", Value::Null)]),
                ],
            )
            .await;
        store
            .insert_rows(
                "dynasty_values",
                vec![
                    row([("player_id", json!("a")), ("value", json!(10))]),
                    row([("player_id", json!("b")), ("value", json!(50))]),
                ],
            )
            .await;

        let with_sleeper = store
            .select_all(&Select::table("players").columns(&["player_id"]).not_null("sleeper_id"))
            .await
            .unwrap();
        assert_eq!(with_sleeper, vec![row([("player_id", json!("a"))])]);

        let values = store
            .select_all(
                &Select::table("dynasty_values")
                    .columns(&["player_id", "value", "players(first_name)"])
                    .order("value.desc"),
            )
            .await
            .unwrap();
        assert_eq!(values[0]["player_id"], json!("b"));
        assert_eq!(values[0]["players"]["first_name"], json!("Bo"));
        assert_eq!(values[1]["players"]["first_name"], json!("Ann"));
    }

    #[tokio::test]
    async fn test_patch_updates_matching_rows() {
        let store = MemoryStore::new();
        store.insert_rows("players", vec![row([("player_id", json!("a")), ("dan_id", Value::Null)])]).await;

        let updates = row([("dan_id", json!("d1"))]);
        store.patch("players", "player_id", "a", &updates).await.unwrap();

        assert_eq!(store.rows("players").await[0]["dan_id"], json!("d1"));
        assert_eq!(store.patches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new("https://x.supabase.co");
        storage.ensure_bucket(&BucketSpec::public_images("headshots")).await.unwrap();
        storage.upload("headshots", "rookies/a.png", "image/png", vec![1, 2, 3]).await.unwrap();

        assert!(storage.has_bucket("headshots").await);
        assert_eq!(storage.object("headshots", "rookies/a.png").await, Some(vec![1, 2, 3]));
        assert_eq!(
            storage.public_url("headshots", "rookies/a.png"),
            "https://x.supabase.co/storage/v1/object/public/headshots/rookies/a.png"
        );
    }
}

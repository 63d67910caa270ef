//! Shared state handed to every pipeline

use crate::config::IngestConfig;
use crate::layout::DataLayout;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use supabase_rest::{RestError, RestStore, Row, Select, UpsertOptions, UpsertSummary};

/// Configuration, data layout and the table store for one run
pub struct IngestContext {
    pub config: IngestConfig,
    pub layout: DataLayout,
    store: Arc<dyn RestStore>,
    today: NaiveDate,
}

impl IngestContext {
    /// For commands that only touch local files; any table access fails
    pub fn offline(config: IngestConfig) -> Self {
        Self::new(config, Arc::new(OfflineStore))
    }

    pub fn new(config: IngestConfig, store: Arc<dyn RestStore>) -> Self {
        let layout = DataLayout::new(config.data.data_dir.clone());
        Self { config, layout, store, today: Local::now().date_naive() }
    }

    /// Pin the run date (ADP rows are keyed by date)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &dyn RestStore {
        self.store.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// `YYYY-MM-DD`
    pub fn today_iso(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    pub fn year(&self) -> i32 {
        self.config.data.year
    }
}

struct OfflineStore;

impl OfflineStore {
    fn refuse<T>(&self, table: &str) -> supabase_rest::Result<T> {
        Err(RestError::missing_credential(format!("SUPABASE_URL (needed for table {table})")))
    }
}

#[async_trait::async_trait]
impl RestStore for OfflineStore {
    async fn select_all(&self, query: &Select) -> supabase_rest::Result<Vec<Row>> {
        self.refuse(query.table_name())
    }

    async fn upsert(&self, table: &str, _rows: Vec<Row>, _options: UpsertOptions) -> supabase_rest::Result<UpsertSummary> {
        self.refuse(table)
    }

    async fn patch(&self, table: &str, _match_col: &str, _match_val: &str, _updates: &Row) -> supabase_rest::Result<()> {
        self.refuse(table)
    }

    async fn count(&self, table: &str) -> supabase_rest::Result<u64> {
        self.refuse(table)
    }
}

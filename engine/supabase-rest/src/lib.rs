//! Supabase REST - PostgREST, Management API and Storage access
//!
//! Reads page through tables with `offset`/`limit`, writes go out as padded
//! bulk upserts with 429 backoff. Everything the pipelines touch goes
//! through the `RestStore` and `ObjectStorage` traits so runs can be
//! pointed at `MemoryStore` for tests and dry runs.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod management;
pub mod memory;
pub mod query;
pub mod storage;
pub mod store;

pub use batch::{pad_rows, parse_content_range, row, BatchError, Row, UpsertOptions, UpsertSummary};
pub use client::SupabaseClient;
pub use config::{RetryConfig, SupabaseConfig};
pub use error::{RestError, Result};
pub use management::ManagementClient;
pub use memory::{MemoryStorage, MemoryStore, PatchRecord};
pub use query::Select;
pub use storage::{public_object_url, BucketSpec, ObjectStorage, StorageClient};
pub use store::{select_as, upsert_grouped, RestStore};

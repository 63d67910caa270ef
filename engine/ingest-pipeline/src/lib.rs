//! Ingestion pipelines for the fantasy football warehouse
//!
//! Each pipeline reads a vendor feed or a local export, resolves the rows to
//! canonical `player_id`s and writes the result to Supabase or to
//! `data/matched/`. Pipelines return a [`report::Summary`] for the binary to
//! print.

pub mod config;
pub mod context;
pub mod layout;
pub mod logging;
pub mod matched_files;
pub mod pipelines;
pub mod players;
pub mod report;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, IngestConfig};
pub use context::IngestContext;
pub use layout::DataLayout;
pub use report::Summary;

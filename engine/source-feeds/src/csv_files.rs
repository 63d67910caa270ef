//! CSV reading shared by the local importers

use crate::error::{FeedError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// Deserialize every row of a CSV file
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|e| FeedError::io(path, e))?;
    reader(file)
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| FeedError::csv(path, e))
}

/// Deserialize every row of CSV text, e.g. a downloaded export
pub fn parse_csv<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    reader(text.as_bytes())
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| FeedError::csv("<download>", e))
}

/// Header row of a CSV file
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).map_err(|e| FeedError::io(path, e))?;
    let headers = reader(file).headers().map_err(|e| FeedError::csv(path, e))?.clone();
    Ok(headers.iter().map(str::to_string).collect())
}

/// Write rows with a fixed header; every row must have one cell per column
pub fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FeedError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| FeedError::csv(path, e))?;
    writer.write_record(headers).map_err(|e| FeedError::csv(path, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| FeedError::csv(path, e))?;
    }
    writer.flush().map_err(|e| FeedError::io(path, e))?;
    Ok(())
}

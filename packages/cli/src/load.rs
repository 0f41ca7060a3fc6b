//! CSV input files.

use std::io::Read;
use std::path::Path;

use choreo_event_models::RawEventRow;
use choreo_geography_models::RegionRow;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid CSV in {path} (record {record}): {source}")]
    Csv {
        path: String,
        record: usize,
        source: csv::Error,
    },
}

/// Reads the event source file.
pub fn read_events(path: &Path) -> Result<Vec<RawEventRow>, LoadError> {
    let file = open(path)?;
    let rows = read_rows(file, path)?;
    log::info!("Read {} event rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Reads the country to region lookup file.
pub fn read_regions(path: &Path) -> Result<Vec<RegionRow>, LoadError> {
    let file = open(path)?;
    let rows = read_rows(file, path)?;
    log::info!("Read {} region rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// Deserializes every record by header name. Columns the row type does not
/// name are ignored.
fn read_rows<T: DeserializeOwned>(reader: impl Read, path: &Path) -> Result<Vec<T>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|source| LoadError::Csv {
                path: path.display().to_string(),
                record: i + 1,
                source,
            })
        })
        .collect()
}

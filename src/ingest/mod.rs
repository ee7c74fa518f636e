//! Import and export of recorded traffic
//!
//! Three input shapes are recognised:
//!
//! - a HAR capture (`{ "log": { "entries": [...] } }`)
//! - an array of exported records
//! - a bundle object mapping a source name to an array of records
//!
//! A directory is read as one source per `.json`/`.har` file.

mod har;
mod normalize;

pub use har::is_har;
pub use normalize::Ingestor;

use std::path::Path;

use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ImportError;
use crate::models::{RawRecord, RequestRecord};

/// A named collection of records, e.g. one imported file
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub records: Vec<RequestRecord>,
}

impl Ingestor {
    /// Normalize every element of a record array, skipping elements that are not records.
    pub fn records_from_array(&self, items: Vec<Value>) -> Vec<RequestRecord> {
        items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<RawRecord>(item) {
                Ok(raw) => Some(self.normalize(raw)),
                Err(err) => {
                    warn!("skipping record {}: {}", index, err);
                    None
                }
            })
            .collect()
    }

    /// Normalize the entries of a HAR capture.
    pub fn records_from_har(&self, value: Value) -> Result<Vec<RequestRecord>, ImportError> {
        let raws = har::har_to_raw_records(value).ok_or(ImportError::UnrecognizedFormat)?;
        if raws.is_empty() {
            return Err(ImportError::NoEntries);
        }
        Ok(raws.into_iter().map(|raw| self.normalize(raw)).collect())
    }

    /// Import an already parsed JSON document. `name` labels single-source inputs.
    pub fn ingest_value(&self, name: &str, value: Value) -> Result<Vec<DataSource>, ImportError> {
        let sources = match value {
            value if is_har(&value) => vec![DataSource {
                name: name.to_string(),
                records: self.records_from_har(value)?,
            }],
            Value::Array(items) => vec![DataSource {
                name: name.to_string(),
                records: self.records_from_array(items),
            }],
            Value::Object(map) if !map.is_empty() && map.values().all(Value::is_array) => map
                .into_iter()
                .map(|(source, items)| DataSource {
                    records: match items {
                        Value::Array(items) => self.records_from_array(items),
                        _ => Vec::new(),
                    },
                    name: source,
                })
                .collect(),
            _ => return Err(ImportError::UnrecognizedFormat),
        };

        for source in &sources {
            info!("imported {} records from {}", source.records.len(), source.name);
        }
        Ok(sources)
    }

    /// Import a JSON document from a string.
    pub fn ingest_str(&self, name: &str, contents: &str) -> Result<Vec<DataSource>, ImportError> {
        let value: Value = serde_json::from_str(contents)?;
        self.ingest_value(name, value)
    }

    /// Import a file, or every `.json`/`.har` file of a directory.
    pub fn ingest_path(&self, path: impl AsRef<Path>) -> Result<Vec<DataSource>, ImportError> {
        let path = path.as_ref();
        if path.is_dir() {
            return self.ingest_dir(path);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.ingest_str(&source_name(path), &contents)
    }

    fn ingest_dir(&self, dir: &Path) -> Result<Vec<DataSource>, ImportError> {
        let read_err = |source| ImportError::Read {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let importable = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("har"));
            if path.is_file() && importable {
                files.push(path);
            }
        }
        files.sort();

        let mut sources = Vec::new();
        for file in files {
            match self.ingest_path(&file) {
                Ok(found) => sources.extend(found),
                Err(err) => warn!("skipping {}: {}", file.display(), err),
            }
        }
        if sources.is_empty() {
            return Err(ImportError::NoEntries);
        }
        Ok(sources)
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serialize records as a pretty JSON array in the export field layout.
pub fn records_to_json<'r, I>(records: I) -> serde_json::Result<String>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let records: Vec<&RequestRecord> = records.into_iter().collect();
    serde_json::to_string_pretty(&records)
}

/// Serialize sources as a bundle object, one array per source name.
pub fn bundle_to_json(sources: &[DataSource]) -> serde_json::Result<String> {
    let bundle: IndexMap<&str, &Vec<RequestRecord>> = sources
        .iter()
        .map(|source| (source.name.as_str(), &source.records))
        .collect();
    serde_json::to_string_pretty(&bundle)
}

/// Write records to `output_path`. Returns the number of records written.
pub fn export_records_to_path<'r, I>(records: I, output_path: impl AsRef<Path>) -> anyhow::Result<usize>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let records: Vec<&RequestRecord> = records.into_iter().collect();
    if records.is_empty() {
        return Err(anyhow!("No records to export"));
    }
    let json = records_to_json(records.iter().copied())?;
    std::fs::write(output_path, json).context("writing records file")?;
    Ok(records.len())
}

/// Write a bundle of sources to `output_path`. Returns the number of records written.
pub fn export_bundle_to_path(sources: &[DataSource], output_path: impl AsRef<Path>) -> anyhow::Result<usize> {
    let total: usize = sources.iter().map(|s| s.records.len()).sum();
    if total == 0 {
        return Err(anyhow!("No records to export"));
    }
    let json = bundle_to_json(sources)?;
    std::fs::write(output_path, json).context("writing bundle file")?;
    Ok(total)
}

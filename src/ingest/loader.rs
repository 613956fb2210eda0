// src/ingest/loader.rs
//
// Reads `{ "locations": [...] }` input files. Malformed files and rows are
// logged and skipped; they never abort a run.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::LocationRecord;
use crate::utils::source_filter::SourceFilterConfig;

#[derive(Debug, Error)]
pub enum InputFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} has no `locations` array")]
    MissingLocations { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub records: Vec<LocationRecord>,
    pub rows_skipped: usize,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<LocationRecord>,
    pub files_loaded: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub rows_skipped: usize,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

/// Lists the `.json` files of every input directory that pass the filename
/// filter, sorted so runs are reproducible.
pub fn discover_input_files(dirs: &[PathBuf], filter: &SourceFilterConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in dirs {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read input directory {}", dir.display()))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list entry in {}", dir.display()))?
                .path();
            let is_json = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
            if !path.is_file() || !is_json {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if filter.allows(&name) {
                found.push(path);
            } else {
                debug!("Skipping {} (filtered by prefix)", name);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Parses one input file. Rows that do not deserialize are counted and
/// dropped; rows without provenance get `"<file stem>#<row index>"`.
pub fn load_file(path: &Path) -> std::result::Result<LoadedFile, InputFileError> {
    let raw = fs::read_to_string(path).map_err(|source| InputFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| InputFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = match document {
        Value::Object(mut map) => match map.remove("locations") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(InputFileError::MissingLocations { path: path.to_path_buf() }),
        },
        _ => return Err(InputFileError::MissingLocations { path: path.to_path_buf() }),
    };

    let stem = file_stem(path);
    let mut records = Vec::with_capacity(rows.len());
    let mut rows_skipped = 0;
    for (idx, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<LocationRecord>(row) {
            Ok(mut record) => {
                if record.provenance.is_empty() {
                    record.add_provenance(format!("{}#{}", stem, idx));
                }
                records.push(record);
            }
            Err(e) => {
                rows_skipped += 1;
                warn!("Skipping row {} of {}: {}", idx, path.display(), e);
            }
        }
    }

    Ok(LoadedFile {
        path: path.to_path_buf(),
        records,
        rows_skipped,
    })
}

/// Loads every file, collecting skipped files into the report instead of
/// failing.
pub fn load_records(files: &[PathBuf]) -> LoadReport {
    let mut report = LoadReport::default();
    for path in files {
        match load_file(path) {
            Ok(loaded) => {
                debug!(
                    "Loaded {} records from {} ({} rows skipped)",
                    loaded.records.len(),
                    path.display(),
                    loaded.rows_skipped
                );
                report.files_loaded += 1;
                report.rows_skipped += loaded.rows_skipped;
                report.records.extend(loaded.records);
            }
            Err(e) => {
                warn!("⚠️  Skipping malformed input file: {}", e);
                report.skipped_files.push(SkippedFile {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(
        "📂 Loaded {} records from {} files ({} files skipped, {} rows skipped)",
        report.records.len(),
        report.files_loaded,
        report.skipped_files.len(),
        report.rows_skipped
    );
    report
}

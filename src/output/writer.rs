// src/output/writer.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geocoding::FailedGeocode;
use crate::ingest::SkippedFile;
use crate::models::{DedupStats, DuplicateBreakdown, GeocodeSummaryCounts, LocationRecord};
use crate::output::regions::region_name;

pub const INDEX_FILE: &str = "index.json";
pub const FAILED_GEOCODES_FILE: &str = "failed_geocodes.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFile {
    pub state: String,
    pub state_name: String,
    pub locations: Vec<LocationRecord>,
    pub location_count: usize,
    pub duplicates_removed: usize,
    pub duplicate_breakdown: DuplicateBreakdown,
    pub last_updated: DateTime<Utc>,
}

impl RegionFile {
    pub fn new(code: &str, locations: Vec<LocationRecord>, stats: &DedupStats, now: DateTime<Utc>) -> Self {
        Self {
            state: code.to_string(),
            state_name: region_name(code).to_string(),
            location_count: locations.len(),
            locations,
            duplicates_removed: stats.duplicate_count,
            duplicate_breakdown: stats.breakdown,
            last_updated: now,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.state)
    }

    pub fn summary(&self) -> RegionSummary {
        RegionSummary {
            state: self.state.clone(),
            state_name: self.state_name.clone(),
            location_count: self.location_count,
            duplicates_removed: self.duplicates_removed,
            file: self.file_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub state: String,
    pub state_name: String,
    pub location_count: usize,
    pub duplicates_removed: usize,
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub run_id: String,
    pub last_updated: DateTime<Utc>,
    pub total_input_records: usize,
    pub total_locations: usize,
    pub total_duplicates_removed: usize,
    pub duplicate_reasons: DuplicateBreakdown,
    pub regions: Vec<RegionSummary>,
    pub skipped_files: Vec<SkippedFile>,
    pub rows_skipped: usize,
    pub geocoding: GeocodeSummaryCounts,
}

/// Same top-level shape as the input files, used when rewriting them in place
/// of the originals.
#[derive(Debug, Serialize)]
pub struct LocationsFile<'a> {
    pub locations: &'a [LocationRecord],
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_region_file(output_dir: &Path, region: &RegionFile) -> Result<PathBuf> {
    let path = output_dir.join(region.file_name());
    write_json(&path, region)?;
    info!(
        "💾 Wrote {} ({} locations, {} duplicates removed)",
        path.display(),
        region.location_count,
        region.duplicates_removed
    );
    Ok(path)
}

pub fn write_index(output_dir: &Path, index: &IndexFile) -> Result<PathBuf> {
    let path = output_dir.join(INDEX_FILE);
    write_json(&path, index)?;
    info!("💾 Wrote {} ({} regions)", path.display(), index.regions.len());
    Ok(path)
}

pub fn write_locations_file(path: &Path, locations: &[LocationRecord]) -> Result<()> {
    write_json(path, &LocationsFile { locations })?;
    info!("💾 Wrote {} ({} locations)", path.display(), locations.len());
    Ok(())
}

pub fn write_failed_geocodes(output_dir: &Path, failed: &[FailedGeocode]) -> Result<PathBuf> {
    let path = output_dir.join(FAILED_GEOCODES_FILE);
    write_json(&path, &failed)?;
    info!("💾 Wrote {} ({} entries)", path.display(), failed.len());
    Ok(path)
}

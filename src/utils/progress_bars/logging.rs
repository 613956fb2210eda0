// src/utils/progress_bars/logging.rs - logging helpers for dedup phases and pipeline runs
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::models::{DedupPhase, GeocodeSummaryCounts, PipelineStats};

fn phase_label(phase: DedupPhase) -> (&'static str, &'static str) {
    match phase {
        DedupPhase::ExactCoordinates => ("EXACT_COORDS", "📌"),
        DedupPhase::AddressMatch => ("ADDRESS", "📍"),
        DedupPhase::FuzzyTitle => ("FUZZY_TITLE", "🔤"),
        DedupPhase::PhoneMatch => ("PHONE", "📞"),
        DedupPhase::Proximity => ("PROXIMITY", "🎯"),
        DedupPhase::NormalizedName => ("CHAIN_NAME", "🏷️"),
    }
}

#[derive(Clone)]
pub struct PhaseLogger {
    name: &'static str,
    emoji: &'static str,
    start_time: Instant,
}

impl PhaseLogger {
    pub fn new(name: &'static str, emoji: &'static str) -> Self {
        Self {
            name,
            emoji,
            start_time: Instant::now(),
        }
    }

    pub fn for_phase(phase: DedupPhase) -> Self {
        let (name, emoji) = phase_label(phase);
        Self::new(name, emoji)
    }

    pub fn log_start(&self, scope: &str, record_count: usize) {
        info!(
            "[{}] {} 🚀 Starting {} for {} ({} records)",
            self.name,
            self.emoji,
            self.name.to_lowercase(),
            scope,
            record_count
        );
    }

    /// One line per phase pass. Passes without merges only log at debug.
    pub fn log_pass_result(&self, round: usize, records_in: usize, records_out: usize, merges: usize) {
        if merges == 0 {
            debug!(
                "[{}] {} Round {}: no merges ({} records)",
                self.name, self.emoji, round, records_in
            );
            return;
        }
        info!(
            "[{}] {} ✅ Round {}: {} records → {} records ({} merges) [+{:.1}s]",
            self.name,
            self.emoji,
            round,
            records_in,
            records_out,
            merges,
            self.start_time.elapsed().as_secs_f32()
        );
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.name, self.emoji, count, issue_type
            );
        }
    }

    pub fn log_progress_update(&self, current: usize, total: usize, additional_info: Option<&str>) {
        let should_log = current == total || (total >= 10 && current % (total / 10) == 0);
        if should_log && current > 0 {
            let percent = (current as f64 / total as f64) * 100.0;
            let msg = if let Some(extra) = additional_info {
                format!("Progress: {}/{} ({:.1}%) - {}", current, total, percent, extra)
            } else {
                format!("Progress: {}/{} ({:.1}%)", current, total, percent)
            };
            info!("[{}] {} 📊 {}", self.name, self.emoji, msg);
        }
    }

    pub fn log_completion(&self, summary: &str) {
        info!(
            "[{}] {} 🎉 COMPLETED in {:.2?}: {}",
            self.name,
            self.emoji,
            self.start_time.elapsed(),
            summary
        );
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.name, self.emoji, message);
    }
}

// Pipeline-level logging functions
pub fn log_pipeline_start(run_id: &str, inputs: &[PathBuf], geocode: bool, dry_run: bool) {
    info!("🚀 ===== LOCATION DEDUP PIPELINE STARTING =====");
    info!("📅 Pipeline Run ID: {}", run_id);
    info!("⚙️  Configuration:");
    info!("   • Input directories: {:?}", inputs);
    info!("   • Geocoding backfill: {}", if geocode { "enabled" } else { "disabled" });
    info!("   • Dry run: {}", if dry_run { "yes (no files written)" } else { "no" });
    info!("🎯 Phases: exact coords 📌, address 📍, fuzzy title 🔤, phone 📞, proximity 🎯, chain name 🏷️");
    info!("================================================");
}

pub fn log_pipeline_phase(phase: &str, details: Option<&str>) {
    let msg = if let Some(details) = details {
        format!("🔄 Pipeline Phase: {} - {}", phase, details)
    } else {
        format!("🔄 Pipeline Phase: {}", phase)
    };
    info!("{}", msg);
}

pub fn log_region_completed(code: &str, name: &str, records_in: usize, records_out: usize, duration: Duration) {
    info!(
        "✅ [{}] {}: {} records → {} unique locations ({} duplicates) in {:.2?}",
        code,
        name,
        records_in,
        records_out,
        records_in.saturating_sub(records_out),
        duration
    );
}

pub fn log_geocode_summary(counts: &GeocodeSummaryCounts) {
    if counts.attempted == 0 && counts.no_address == 0 {
        return;
    }
    let success_rate = if counts.attempted > 0 {
        (counts.succeeded as f64 / counts.attempted as f64) * 100.0
    } else {
        0.0
    };
    info!(
        "🛰️  Geocoding: {} attempted, {} succeeded ({:.1}%), {} failed, {} without address",
        counts.attempted, counts.succeeded, success_rate, counts.failed, counts.no_address
    );
}

pub fn log_pipeline_completion(stats: &PipelineStats) {
    info!("🎉 ===== LOCATION DEDUP PIPELINE COMPLETED =====");
    info!("📅 Pipeline Run ID: {}", stats.run_id);
    info!("⏱️  Total Duration: {:.2}s", stats.total_processing_time);
    info!(
        "📊 {} input records → {} unique locations across {} regions",
        stats.total_input_records, stats.total_output_records, stats.total_regions
    );
    info!("");
    info!("📈 Duplicate Reasons:");
    for phase in DedupPhase::ALL {
        let (_, emoji) = phase_label(phase);
        info!("  {} {}: {}", emoji, phase.as_str(), stats.dedup.breakdown.get(phase));
    }
    info!("  • Total duplicates removed: {}", stats.dedup.duplicate_count);
    if stats.rows_skipped > 0 || stats.files_skipped > 0 {
        warn!(
            "⚠️  Skipped {} malformed files and {} malformed rows",
            stats.files_skipped, stats.rows_skipped
        );
    }
    log_geocode_summary(&stats.geocoding);
    info!(
        "⏱️  Phase times: load {:.2}s, geocoding {:.2}s, dedup {:.2}s",
        stats.load_time, stats.geocoding_time, stats.dedup_time
    );
    info!("===============================================");
}

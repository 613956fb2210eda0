// src/models/stats_models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The six ordered dedup phases. The serialized names are the duplicate-reason
/// keys written to the region files and `index.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPhase {
    ExactCoordinates,
    AddressMatch,
    FuzzyTitle,
    PhoneMatch,
    Proximity,
    NormalizedName,
}

impl DedupPhase {
    pub const ALL: [DedupPhase; 6] = [
        DedupPhase::ExactCoordinates,
        DedupPhase::AddressMatch,
        DedupPhase::FuzzyTitle,
        DedupPhase::PhoneMatch,
        DedupPhase::Proximity,
        DedupPhase::NormalizedName,
    ];

    /// Duplicate-reason key, identical to the serde name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupPhase::ExactCoordinates => "exact_coordinates",
            DedupPhase::AddressMatch => "address_match",
            DedupPhase::FuzzyTitle => "fuzzy_title",
            DedupPhase::PhoneMatch => "phone_match",
            DedupPhase::Proximity => "proximity",
            DedupPhase::NormalizedName => "normalized_name",
        }
    }
}

/// Per-reason duplicate counters, serialized with exactly the six reason keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateBreakdown {
    pub exact_coordinates: usize,
    pub address_match: usize,
    pub fuzzy_title: usize,
    pub phone_match: usize,
    pub proximity: usize,
    pub normalized_name: usize,
}

impl DuplicateBreakdown {
    pub fn get(&self, phase: DedupPhase) -> usize {
        match phase {
            DedupPhase::ExactCoordinates => self.exact_coordinates,
            DedupPhase::AddressMatch => self.address_match,
            DedupPhase::FuzzyTitle => self.fuzzy_title,
            DedupPhase::PhoneMatch => self.phone_match,
            DedupPhase::Proximity => self.proximity,
            DedupPhase::NormalizedName => self.normalized_name,
        }
    }

    fn slot_mut(&mut self, phase: DedupPhase) -> &mut usize {
        match phase {
            DedupPhase::ExactCoordinates => &mut self.exact_coordinates,
            DedupPhase::AddressMatch => &mut self.address_match,
            DedupPhase::FuzzyTitle => &mut self.fuzzy_title,
            DedupPhase::PhoneMatch => &mut self.phone_match,
            DedupPhase::Proximity => &mut self.proximity,
            DedupPhase::NormalizedName => &mut self.normalized_name,
        }
    }

    pub fn total(&self) -> usize {
        DedupPhase::ALL.iter().map(|p| self.get(*p)).sum()
    }

    pub fn absorb(&mut self, other: &DuplicateBreakdown) {
        for phase in DedupPhase::ALL {
            *self.slot_mut(phase) += other.get(phase);
        }
    }
}

/// Duplicate bookkeeping threaded explicitly through every phase call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub duplicate_count: usize,
    pub breakdown: DuplicateBreakdown,
}

impl DedupStats {
    pub fn record_merge(mut self, phase: DedupPhase) -> Self {
        self.duplicate_count += 1;
        *self.breakdown.slot_mut(phase) += 1;
        self
    }

    pub fn combine(mut self, other: &DedupStats) -> Self {
        self.duplicate_count += other.duplicate_count;
        self.breakdown.absorb(&other.breakdown);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: DedupPhase,
    pub round: usize,
    pub records_in: usize,
    pub records_out: usize,
    pub merges: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeSummaryCounts {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub no_address: usize,
}

impl GeocodeSummaryCounts {
    pub fn absorb(&mut self, other: &GeocodeSummaryCounts) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.no_address += other.no_address;
    }
}

#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub total_input_records: usize,
    pub total_output_records: usize,
    pub total_regions: usize,
    pub rows_skipped: usize,
    pub files_skipped: usize,
    pub dedup: DedupStats,
    pub geocoding: GeocodeSummaryCounts,
    pub load_time: f64,
    pub geocoding_time: f64,
    pub dedup_time: f64,
    pub total_processing_time: f64,
}

impl PipelineStats {
    pub fn new(run_id: String, run_timestamp: NaiveDateTime) -> Self {
        Self {
            run_id,
            run_timestamp,
            total_input_records: 0,
            total_output_records: 0,
            total_regions: 0,
            rows_skipped: 0,
            files_skipped: 0,
            dedup: DedupStats::default(),
            geocoding: GeocodeSummaryCounts::default(),
            load_time: 0.0,
            geocoding_time: 0.0,
            dedup_time: 0.0,
            total_processing_time: 0.0,
        }
    }
}

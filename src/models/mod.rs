pub mod location;
pub mod stats_models;

pub use location::{Coordinates, GeocodeAudit, GeocodeStatus, LocationRecord, Review};
pub use stats_models::{
    DedupPhase, DedupStats, DuplicateBreakdown, GeocodeSummaryCounts, PhaseStats, PipelineStats,
};

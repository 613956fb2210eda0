pub mod address;
pub mod geospatial;
pub mod manager;
pub mod merge;
pub mod name;
pub mod phases;
pub mod phone;
pub mod similarity;

pub use manager::{run_dedup_pipeline, DedupConfig, DedupResult};
pub use merge::merge_records;
pub use phases::{run_phase, MatchMode, PhaseSpec, PHASES};

pub mod regions;
pub mod writer;

pub use regions::{group_by_region, region_name, resolve_region, UNKNOWN_REGION};
pub use writer::{IndexFile, RegionFile, RegionSummary};

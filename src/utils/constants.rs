// src/utils/constants.rs

/// Decimal places kept when building the exact-coordinate key (~11 m grid).
pub const COORDINATE_KEY_DECIMALS: usize = 4;

/// Normalized addresses must be longer than this to be used as a match key.
pub const MIN_ADDRESS_KEY_LEN: usize = 10;

/// Normalized names shorter than this are never used for matching.
pub const MIN_NAME_KEY_LEN: usize = 3;

pub const FUZZY_TITLE_MAX_DISTANCE_KM: f64 = 50.0;
pub const FUZZY_TITLE_MIN_SIMILARITY: f64 = 0.85;

pub const PHONE_MATCH_MAX_DISTANCE_KM: f64 = 100.0;

/// 100 m proximity cluster.
pub const PROXIMITY_MAX_DISTANCE_KM: f64 = 0.1;
pub const PROXIMITY_MIN_TITLE_SIMILARITY: f64 = 0.6;

pub const CHAIN_NAME_MAX_DISTANCE_KM: f64 = 25.0;

/// Candidate geocode queries of this length or shorter are discarded.
pub const MIN_GEOCODE_QUERY_LEN: usize = 5;

pub mod geocoding;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod output;
pub mod utils;

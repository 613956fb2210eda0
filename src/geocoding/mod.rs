pub mod backfill;
pub mod candidates;
pub mod client;
pub mod confidence;
pub mod config;
pub mod rate_limiter;

use thiserror::Error;

pub use backfill::{BackfillReport, FailedGeocode, GeocodeOutcome, Geocoder};
pub use client::{GeocodeCandidate, GeocodeProvider, NominatimClient};
pub use config::GeocoderConfig;

/// Classified failure of a single provider request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("geocoder returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unparseable geocoder response: {0}")]
    Parse(String),
}

impl GeocodeError {
    /// Timeouts, connection failures and non-2xx responses are worth another
    /// attempt; a response we cannot parse will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeocodeError::Network(_) | GeocodeError::HttpStatus { .. })
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeocodeError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            GeocodeError::HttpStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            GeocodeError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(GeocodeError::Network("timed out".into()).is_retryable());
        assert!(GeocodeError::HttpStatus { status: 503, body: String::new() }.is_retryable());
        assert!(!GeocodeError::Parse("expected array".into()).is_retryable());
    }
}

// src/geocoding/backfill.rs
//
// Per-record geocoding: candidate queries are tried in priority order, each
// through its own retry loop, with every outbound request going through the
// shared rate limiter.

use indicatif::ProgressBar;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::geocoding::candidates::generate_candidates;
use crate::geocoding::client::GeocodeProvider;
use crate::geocoding::confidence::score_candidate;
use crate::geocoding::config::GeocoderConfig;
use crate::geocoding::rate_limiter::RateLimiter;
use crate::matching::geospatial::is_suspicious_coordinate;
use crate::models::{Coordinates, GeocodeAudit, GeocodeStatus, GeocodeSummaryCounts, LocationRecord};
use crate::utils::progress_bars::logging::PhaseLogger;

/// Lifecycle of one candidate query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    NotTried,
    /// Request `n` has been sent.
    Attempted(u32),
    /// Request `n` failed with a retryable error; backing off.
    Retrying(u32),
    Succeeded,
    /// Every attempt failed with a retryable error.
    ExhaustedRetries,
    /// The provider answered, but nothing reached the confidence floor.
    NoAcceptableResult,
    /// Non-retryable failure (unparseable response).
    Rejected,
}

impl CandidateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            CandidateState::NotTried | CandidateState::Attempted(_) | CandidateState::Retrying(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrace {
    pub query: String,
    pub attempts: u32,
    pub state: CandidateState,
    pub best_confidence: Option<f64>,
    pub last_error: Option<String>,
}

impl CandidateTrace {
    fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            attempts: 0,
            state: CandidateState::NotTried,
            best_confidence: None,
            last_error: None,
        }
    }

    fn describe(&self) -> String {
        match self.state {
            CandidateState::ExhaustedRetries => format!(
                "'{}' failed after {} attempts: {}",
                self.query,
                self.attempts,
                self.last_error.as_deref().unwrap_or("unknown error")
            ),
            CandidateState::NoAcceptableResult => match self.best_confidence {
                Some(c) => format!("'{}' best result confidence {:.2} below threshold", self.query, c),
                None => format!("'{}' returned no results", self.query),
            },
            CandidateState::Rejected => format!(
                "'{}' rejected: {}",
                self.query,
                self.last_error.as_deref().unwrap_or("unknown error")
            ),
            state => format!("'{}' ended in state {:?}", self.query, state),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Succeeded {
        coordinates: Coordinates,
        confidence: f64,
        query: String,
        attempted: Vec<String>,
    },
    Failed {
        attempted: Vec<String>,
        reason: String,
    },
    /// No usable address candidates; the record passes through untouched.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RecordGeocode {
    pub outcome: GeocodeOutcome,
    pub traces: Vec<CandidateTrace>,
}

/// Entry of `failed_geocodes.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedGeocode {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub reason: String,
    pub attempted_addresses: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub records: Vec<LocationRecord>,
    pub summary: GeocodeSummaryCounts,
    pub failed: Vec<FailedGeocode>,
}

/// Whether a record should be sent to the geocoder.
pub fn needs_geocoding(record: &LocationRecord, include_suspicious: bool) -> bool {
    match &record.coordinates {
        None => true,
        Some(coords) => include_suspicious && is_suspicious_coordinate(coords),
    }
}

/// Writes the outcome onto the record. Failures never touch the existing
/// coordinates.
pub fn apply_outcome(mut record: LocationRecord, outcome: &GeocodeOutcome) -> LocationRecord {
    record.geocode = Some(match outcome {
        GeocodeOutcome::Succeeded {
            coordinates,
            confidence,
            query,
            attempted,
        } => {
            record.coordinates = Some(*coordinates);
            GeocodeAudit {
                status: GeocodeStatus::Success,
                confidence: Some(*confidence),
                query: Some(query.clone()),
                attempted_addresses: attempted.clone(),
                reason: None,
            }
        }
        GeocodeOutcome::Failed { attempted, reason } => GeocodeAudit {
            status: GeocodeStatus::Failed,
            confidence: None,
            query: None,
            attempted_addresses: attempted.clone(),
            reason: Some(reason.clone()),
        },
        GeocodeOutcome::Skipped => GeocodeAudit {
            status: GeocodeStatus::NoAddress,
            confidence: None,
            query: None,
            attempted_addresses: Vec::new(),
            reason: Some("no usable address candidates".to_string()),
        },
    });
    record
}

pub struct Geocoder<P: GeocodeProvider> {
    provider: P,
    config: GeocoderConfig,
    limiter: RateLimiter,
}

impl<P: GeocodeProvider> Geocoder<P> {
    pub fn new(provider: P, config: GeocoderConfig) -> Self {
        let limiter = RateLimiter::new(config.min_interval);
        Self {
            provider,
            config,
            limiter,
        }
    }

    /// Runs one candidate query through its retry loop.
    async fn try_candidate(&self, query: &str) -> (CandidateTrace, Option<(Coordinates, f64)>) {
        let mut trace = CandidateTrace::new(query);

        while !trace.state.is_terminal() {
            let attempt = trace.attempts + 1;
            self.limiter.wait().await;
            trace.attempts = attempt;
            trace.state = CandidateState::Attempted(attempt);

            match self.provider.search(query).await {
                Ok(results) => {
                    let mut best: Option<(Coordinates, f64)> = None;
                    for result in &results {
                        if let Some(coords) = result.coordinates() {
                            let confidence = score_candidate(result, query);
                            if best.map_or(true, |(_, c)| confidence > c) {
                                best = Some((coords, confidence));
                            }
                        }
                    }
                    trace.best_confidence = best.map(|(_, c)| c);
                    return match best {
                        Some((coords, confidence)) if confidence >= self.config.min_confidence => {
                            trace.state = CandidateState::Succeeded;
                            (trace, Some((coords, confidence)))
                        }
                        _ => {
                            trace.state = CandidateState::NoAcceptableResult;
                            (trace, None)
                        }
                    };
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    trace.last_error = Some(e.to_string());
                    trace.state = CandidateState::Retrying(attempt);
                    let delay = self.config.retry_delay * attempt;
                    debug!("Geocode '{}' attempt {} failed ({}), retrying in {:?}", query, attempt, e, delay);
                    sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    trace.last_error = Some(e.to_string());
                    trace.state = CandidateState::ExhaustedRetries;
                }
                Err(e) => {
                    trace.last_error = Some(e.to_string());
                    trace.state = CandidateState::Rejected;
                }
            }
        }
        (trace, None)
    }

    /// Tries each candidate in priority order until one yields an acceptable
    /// result.
    pub async fn geocode_record(&self, record: &LocationRecord) -> RecordGeocode {
        let candidates = generate_candidates(record);
        if candidates.is_empty() {
            return RecordGeocode {
                outcome: GeocodeOutcome::Skipped,
                traces: Vec::new(),
            };
        }

        let mut traces = Vec::with_capacity(candidates.len());
        for (idx, query) in candidates.iter().enumerate() {
            let (trace, accepted) = self.try_candidate(query).await;
            traces.push(trace);
            if let Some((coordinates, confidence)) = accepted {
                return RecordGeocode {
                    outcome: GeocodeOutcome::Succeeded {
                        coordinates,
                        confidence,
                        query: query.clone(),
                        attempted: candidates[..=idx].to_vec(),
                    },
                    traces,
                };
            }
        }

        let reason = traces
            .iter()
            .map(CandidateTrace::describe)
            .collect::<Vec<_>>()
            .join("; ");
        RecordGeocode {
            outcome: GeocodeOutcome::Failed {
                attempted: candidates,
                reason,
            },
            traces,
        }
    }

    /// Geocodes every record that needs it, returning all records (updated or
    /// not) in their original order.
    pub async fn backfill_records(
        &self,
        records: Vec<LocationRecord>,
        include_suspicious: bool,
        scope: &str,
        progress: Option<&ProgressBar>,
    ) -> BackfillReport {
        let logger = PhaseLogger::new("GEOCODE", "🛰️");
        let pending = records
            .iter()
            .filter(|r| needs_geocoding(r, include_suspicious))
            .count();
        if pending == 0 {
            logger.log_debug(&format!("{}: nothing to geocode", scope));
            return BackfillReport {
                records,
                ..Default::default()
            };
        }
        logger.log_start(scope, pending);
        if let Some(pb) = progress {
            pb.set_length(pending as u64);
            pb.set_position(0);
        }

        let mut report = BackfillReport {
            records: Vec::with_capacity(records.len()),
            ..Default::default()
        };
        let mut done = 0;

        for record in records {
            if !needs_geocoding(&record, include_suspicious) {
                report.records.push(record);
                continue;
            }

            let result = self.geocode_record(&record).await;
            match &result.outcome {
                GeocodeOutcome::Succeeded { query, confidence, .. } => {
                    report.summary.attempted += 1;
                    report.summary.succeeded += 1;
                    debug!("Geocoded '{}' via '{}' ({:.2})", record.title_str(), query, confidence);
                }
                GeocodeOutcome::Failed { attempted, reason } => {
                    report.summary.attempted += 1;
                    report.summary.failed += 1;
                    warn!("Geocode failed for '{}': {}", record.title_str(), reason);
                    report.failed.push(FailedGeocode {
                        title: record.title.clone(),
                        address: record.address.clone(),
                        city: record.city.clone(),
                        state: record.state_code.clone().or_else(|| record.state.clone()),
                        reason: reason.clone(),
                        attempted_addresses: attempted.clone(),
                    });
                }
                GeocodeOutcome::Skipped => {
                    report.summary.no_address += 1;
                }
            }
            report.records.push(apply_outcome(record, &result.outcome));

            done += 1;
            if let Some(pb) = progress {
                pb.inc(1);
                pb.set_message(format!(
                    "{}: {} ok, {} failed",
                    scope, report.summary.succeeded, report.summary.failed
                ));
            }
            logger.log_progress_update(done, pending, None);
        }

        logger.log_data_quality_issue("records without a usable address", report.summary.no_address);
        logger.log_completion(&format!(
            "{} attempted, {} succeeded, {} failed",
            report.summary.attempted, report.summary.succeeded, report.summary.failed
        ));
        info!(
            "🛰️  {}: geocoded {}/{} records",
            scope, report.summary.succeeded, pending
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::client::{CandidateAddress, GeocodeCandidate};
    use crate::geocoding::GeocodeError;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted responses per query; unscripted queries return no results.
    #[derive(Default)]
    struct ScriptedProvider {
        scripts: Mutex<HashMap<String, VecDeque<Result<Vec<GeocodeCandidate>, GeocodeError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn script(self, query: &str, responses: Vec<Result<Vec<GeocodeCandidate>, GeocodeError>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(query.to_string(), responses.into_iter().collect());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeocodeProvider for ScriptedProvider {
        async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
            self.calls.lock().unwrap().push(query.to_string());
            self.scripts
                .lock()
                .unwrap()
                .get_mut(query)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn fast_config() -> GeocoderConfig {
        GeocoderConfig {
            min_interval: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn good_hit(lat: f64, lon: f64) -> GeocodeCandidate {
        GeocodeCandidate {
            lat: Some(lat),
            lon: Some(lon),
            importance: Some(0.5),
            kind: Some("commercial".to_string()),
            class: Some("amenity".to_string()),
            display_name: None,
            address: Some(CandidateAddress {
                house_number: Some("100".to_string()),
                road: Some("Main St".to_string()),
                ..Default::default()
            }),
        }
    }

    fn network_error() -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        Err(GeocodeError::Network("connection reset".to_string()))
    }

    const ADDRESS: &str = "100 Main St, Springfield, IL";

    /// Single candidate: the comma-separated address.
    fn address_only() -> LocationRecord {
        LocationRecord {
            address: Some(ADDRESS.to_string()),
            provenance: vec!["springfield.json#0".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_three_failures_then_stop() {
        let provider = ScriptedProvider::default().script(
            ADDRESS,
            vec![network_error(), network_error(), network_error(), Ok(vec![good_hit(39.8, -89.6)])],
        );
        let geocoder = Geocoder::new(provider, fast_config());

        let result = geocoder.geocode_record(&address_only()).await;
        assert_eq!(geocoder.provider.calls(), vec![ADDRESS, ADDRESS, ADDRESS]);
        assert_eq!(result.traces.len(), 1);
        assert_eq!(result.traces[0].attempts, 3);
        assert_eq!(result.traces[0].state, CandidateState::ExhaustedRetries);
        match &result.outcome {
            GeocodeOutcome::Failed { attempted, reason } => {
                assert_eq!(attempted, &vec![ADDRESS.to_string()]);
                assert!(reason.contains("3 attempts"));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let record = apply_outcome(address_only(), &result.outcome);
        assert!(record.coordinates.is_none());
        let audit = record.geocode.unwrap();
        assert_eq!(audit.status, GeocodeStatus::Failed);
        assert_eq!(audit.attempted_addresses, vec![ADDRESS]);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let provider = ScriptedProvider::default()
            .script(ADDRESS, vec![network_error(), Ok(vec![good_hit(39.8, -89.6)])]);
        let geocoder = Geocoder::new(provider, fast_config());

        let result = geocoder.geocode_record(&address_only()).await;
        assert_eq!(result.traces[0].attempts, 2);
        assert_eq!(result.traces[0].state, CandidateState::Succeeded);
        match result.outcome {
            GeocodeOutcome::Succeeded { coordinates, confidence, query, attempted } => {
                assert_eq!(coordinates, Coordinates { lat: 39.8, lng: -89.6 });
                // 0.2 + 0.2 + 0.2 + 0.15
                assert!((confidence - 0.75).abs() < 1e-9);
                assert_eq!(query, ADDRESS);
                assert_eq!(attempted, vec![ADDRESS]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_low_confidence_falls_through_to_next_candidate() {
        let record = LocationRecord {
            title: Some("Flying J".to_string()),
            address: Some(ADDRESS.to_string()),
            city: Some("Springfield".to_string()),
            state_code: Some("IL".to_string()),
            ..Default::default()
        };
        let vague = GeocodeCandidate {
            lat: Some(39.0),
            lon: Some(-89.0),
            importance: Some(0.1),
            kind: Some("administrative".to_string()),
            class: Some("boundary".to_string()),
            ..Default::default()
        };
        let provider = ScriptedProvider::default()
            .script(ADDRESS, vec![Ok(vec![vague])])
            .script("Flying J, Springfield, IL", vec![Ok(vec![good_hit(39.8, -89.6)])]);
        let geocoder = Geocoder::new(provider, fast_config());

        let result = geocoder.geocode_record(&record).await;
        assert_eq!(result.traces[0].state, CandidateState::NoAcceptableResult);
        assert_eq!(result.traces[0].attempts, 1);
        match result.outcome {
            GeocodeOutcome::Succeeded { query, attempted, .. } => {
                assert_eq!(query, "Flying J, Springfield, IL");
                assert_eq!(attempted, vec![ADDRESS, "Flying J, Springfield, IL"]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_error_is_not_retried() {
        let provider = ScriptedProvider::default()
            .script(ADDRESS, vec![Err(GeocodeError::Parse("bad json".to_string()))]);
        let geocoder = Geocoder::new(provider, fast_config());

        let result = geocoder.geocode_record(&address_only()).await;
        assert_eq!(geocoder.provider.calls().len(), 1);
        assert_eq!(result.traces[0].state, CandidateState::Rejected);
        assert!(matches!(result.outcome, GeocodeOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_no_candidates_is_skipped() {
        let geocoder = Geocoder::new(ScriptedProvider::default(), fast_config());
        let record = LocationRecord {
            title: Some("Gym".to_string()),
            ..Default::default()
        };
        let result = geocoder.geocode_record(&record).await;
        assert_eq!(result.outcome, GeocodeOutcome::Skipped);
        assert!(geocoder.provider.calls().is_empty());

        let tagged = apply_outcome(record, &result.outcome);
        assert_eq!(tagged.geocode.map(|g| g.status), Some(GeocodeStatus::NoAddress));
    }

    #[tokio::test]
    async fn test_backfill_records() {
        let located = LocationRecord {
            title: Some("Already There".to_string()),
            coordinates: Coordinates::new(40.0, -75.0),
            ..Default::default()
        };
        let null_island = LocationRecord {
            title: Some("Null Island Gym".to_string()),
            address: Some("5 Elm Street, Dover, DE".to_string()),
            coordinates: Coordinates::new(0.0, 0.0),
            ..Default::default()
        };
        let blank = LocationRecord::default();
        let records = vec![located.clone(), address_only(), null_island.clone(), blank];

        let provider = ScriptedProvider::default()
            .script(
                ADDRESS,
                vec![Ok(vec![good_hit(39.8, -89.6)]), Ok(vec![good_hit(39.8, -89.6)])],
            )
            .script("5 Elm Street, Dover, DE", vec![network_error(), network_error(), network_error()]);
        let geocoder = Geocoder::new(provider, fast_config());

        let report = geocoder.backfill_records(records.clone(), false, "IL", None).await;
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.records[0], located);
        assert_eq!(report.records[1].coordinates, Coordinates::new(39.8, -89.6));
        // suspicious coordinates are left alone unless asked for
        assert_eq!(report.records[2], null_island);
        assert_eq!(report.summary.attempted, 1);
        assert_eq!(report.summary.no_address, 1);
        assert!(report.failed.is_empty());

        let report = geocoder.backfill_records(records, true, "IL", None).await;
        assert_eq!(report.summary.attempted, 2);
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].title.as_deref(), Some("Null Island Gym"));
        // failed geocode keeps the original pair
        assert_eq!(report.records[2].coordinates, Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn test_needs_geocoding() {
        let mut record = LocationRecord::default();
        assert!(needs_geocoding(&record, false));
        record.coordinates = Coordinates::new(41.8, 87.6);
        assert!(!needs_geocoding(&record, false));
        assert!(needs_geocoding(&record, true));
        record.coordinates = Coordinates::new(41.8, -87.6);
        assert!(!needs_geocoding(&record, true));
    }
}

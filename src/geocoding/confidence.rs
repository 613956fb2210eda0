// src/geocoding/confidence.rs
//
// Multi-factor trust score for a single geocode result against the query that
// produced it.

use crate::geocoding::client::GeocodeCandidate;

const IMPORTANCE_WEIGHT: f64 = 0.4;
const HOUSE_NUMBER_BONUS: f64 = 0.2;
const ROAD_BONUS: f64 = 0.2;
const LOCALITY_BONUS: f64 = 0.15;
const PRECISE_TYPE_BONUS: f64 = 0.15;
const VENUE_CLASS_BONUS: f64 = 0.1;
const ADMINISTRATIVE_PENALTY: f64 = 0.2;

const PRECISE_TYPES: [&str; 3] = ["house", "building", "commercial"];
const VENUE_CLASSES: [&str; 3] = ["amenity", "leisure", "shop"];

fn appears_in(token: Option<&str>, query_lower: &str) -> bool {
    token
        .map(|t| t.trim().to_lowercase())
        .map_or(false, |t| !t.is_empty() && query_lower.contains(&t))
}

/// Confidence in [0, 1] for `candidate` as an answer to `query`.
pub fn score_candidate(candidate: &GeocodeCandidate, query: &str) -> f64 {
    let query_lower = query.to_lowercase();
    let mut score = IMPORTANCE_WEIGHT * candidate.importance.unwrap_or(0.0);

    if let Some(address) = &candidate.address {
        if appears_in(address.house_number.as_deref(), &query_lower) {
            score += HOUSE_NUMBER_BONUS;
        }
        if appears_in(address.road.as_deref(), &query_lower) {
            score += ROAD_BONUS;
        }
        if appears_in(address.locality(), &query_lower) {
            score += LOCALITY_BONUS;
        }
    }

    let kind = candidate.kind.as_deref().unwrap_or("");
    let class = candidate.class.as_deref().unwrap_or("");
    if PRECISE_TYPES.contains(&kind) {
        score += PRECISE_TYPE_BONUS;
    } else if VENUE_CLASSES.contains(&class) {
        score += VENUE_CLASS_BONUS;
    }
    if kind == "administrative" || class == "boundary" {
        score -= ADMINISTRATIVE_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::client::CandidateAddress;

    fn candidate(importance: f64, class: &str, kind: &str, address: CandidateAddress) -> GeocodeCandidate {
        GeocodeCandidate {
            lat: Some(39.78),
            lon: Some(-89.65),
            importance: Some(importance),
            kind: Some(kind.to_string()),
            class: Some(class.to_string()),
            display_name: None,
            address: Some(address),
        }
    }

    #[test]
    fn test_amenity_with_road_match() {
        let c = candidate(
            0.6,
            "amenity",
            "gym",
            CandidateAddress {
                road: Some("Main Street".to_string()),
                ..Default::default()
            },
        );
        let score = score_candidate(&c, "Main Street, Springfield, IL");
        assert!((score - 0.54).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_full_match_clamped_to_one() {
        let c = candidate(
            0.9,
            "building",
            "house",
            CandidateAddress {
                house_number: Some("100".to_string()),
                road: Some("Main St".to_string()),
                city: Some("Springfield".to_string()),
                ..Default::default()
            },
        );
        // 0.36 + 0.2 + 0.2 + 0.15 + 0.15 = 1.06
        assert_eq!(score_candidate(&c, "100 Main St, Springfield, IL"), 1.0);
    }

    #[test]
    fn test_administrative_penalty_floors_at_zero() {
        let c = candidate(0.3, "boundary", "administrative", CandidateAddress::default());
        assert_eq!(score_candidate(&c, "Springfield, IL"), 0.0);

        let town = candidate(
            0.5,
            "boundary",
            "administrative",
            CandidateAddress {
                town: Some("Springfield".to_string()),
                ..Default::default()
            },
        );
        // 0.2 + 0.15 - 0.2
        assert!((score_candidate(&town, "springfield, il") - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_missing_details() {
        let bare = GeocodeCandidate::default();
        assert_eq!(score_candidate(&bare, "anything"), 0.0);
        let shop = GeocodeCandidate {
            class: Some("shop".to_string()),
            ..Default::default()
        };
        assert!((score_candidate(&shop, "anything") - 0.1).abs() < 1e-9);
    }
}
